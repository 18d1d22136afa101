//! Facilities for retrieving remote nanopublications.
//!
//! Nanopublication servers speak TriG, so unlike general RDF retrieval there is
//! no content sniffing here: the request advertises `application/trig` and the
//! response must come back with that media type, otherwise the fetch fails with
//! a protocol error.

use crate::consts::TRIG_MEDIA_TYPE;
use crate::errors::NanopubError;
use anyhow::{anyhow, Result};
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;

/// Options that control how remote documents are fetched.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Fail immediately when `true`; callers use this to guard offline modes.
    pub offline: bool,
    /// Overall network timeout applied to individual HTTP requests.
    pub timeout: Duration,
    /// Media type sent in `Accept` and required in the response `Content-Type`.
    pub accept: &'static str,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            offline: false,
            timeout: Duration::from_secs(10),
            accept: TRIG_MEDIA_TYPE,
        }
    }
}

/// Successful network fetch: the decoded body and the final URL after redirects.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub body: String,
    pub final_url: String,
    pub content_type: String,
}

/// Returns the bare media type of a `Content-Type` header value, lower-cased,
/// without parameters such as `charset`.
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Checks the response media type against the one that was requested.
pub fn check_content_type(url: &str, content_type: Option<&str>, expected: &str) -> Result<()> {
    match content_type {
        Some(ct) if media_type(ct) == expected => Ok(()),
        Some(ct) => Err(anyhow!(NanopubError::Protocol {
            url: url.to_string(),
            reason: format!("unexpected content type '{}', expected '{}'", ct, expected),
        })),
        None => Err(anyhow!(NanopubError::Protocol {
            url: url.to_string(),
            reason: "response has no content type".to_string(),
        })),
    }
}

/// Fetches a TriG document from `url`. Non-success statuses and any content type
/// other than `application/trig` are reported as [`NanopubError::Protocol`]; no
/// retries are attempted.
pub fn fetch_trig(url: &str, opts: &FetchOptions) -> Result<FetchResult> {
    if opts.offline {
        return Err(anyhow!(NanopubError::Offline {
            url: url.to_string()
        }));
    }
    debug!("Fetching {} (accept {})", url, opts.accept);
    let client = Client::builder().timeout(opts.timeout).build()?;
    let resp = client
        .get(url)
        .header(ACCEPT, opts.accept)
        .send()
        .map_err(|e| {
            anyhow!(NanopubError::Protocol {
                url: url.to_string(),
                reason: e.to_string(),
            })
        })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!(NanopubError::Protocol {
            url: url.to_string(),
            reason: format!("HTTP status {}", status),
        }));
    }
    let final_url = resp.url().to_string();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    check_content_type(url, content_type.as_deref(), opts.accept)?;
    let body = resp.text()?;
    Ok(FetchResult {
        body,
        final_url,
        content_type: content_type.unwrap_or_default(),
    })
}
