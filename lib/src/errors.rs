//! Error taxonomy for loading, extracting and instantiating nanopublications.
//!
//! Library functions return `anyhow::Result`; these values are wrapped with
//! `anyhow!` so callers can `downcast_ref::<NanopubError>()` to tell a
//! protocol failure from a parse failure or a structurally broken document.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NanopubError {
    /// Bad HTTP status or a content type other than `application/trig`.
    Protocol { url: String, reason: String },
    /// The content is not valid TriG.
    Parse { source_name: String, message: String },
    /// A mandatory graph-linkage quad is missing or duplicated.
    Malformed { reason: String },
    /// A network read was requested while the configuration is offline.
    Offline { url: String },
}

impl NanopubError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        NanopubError::Malformed {
            reason: reason.into(),
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, NanopubError::Malformed { .. })
    }
}

impl fmt::Display for NanopubError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NanopubError::Protocol { url, reason } => {
                write!(f, "Failed to fetch {}: {}", url, reason)
            }
            NanopubError::Parse {
                source_name,
                message,
            } => write!(f, "Failed to parse TriG from {}: {}", source_name, message),
            NanopubError::Malformed { reason } => {
                write!(f, "Malformed nanopublication: {}", reason)
            }
            NanopubError::Offline { url } => {
                write!(f, "Refusing to fetch {} in offline mode", url)
            }
        }
    }
}

impl std::error::Error for NanopubError {}
