//! Helpers for working with URIs as strings: namespace prefix maps, URI tails
//! for display, and normalisation of template-ontology URIs.

use crate::consts::NT_NAMESPACE;
use serde::Serialize;

/// Namespace prefixes in declaration order. Re-declaring a prefix replaces its
/// namespace but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrefixMap {
    entries: Vec<(String, String)>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        let prefix = prefix.into();
        let namespace = namespace.into();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = namespace,
            None => self.entries.push((prefix, namespace)),
        }
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compacts `uri` into `prefix:local` for display, using the longest
    /// matching namespace. Returns `None` when no namespace matches or the
    /// remainder spans further path segments, a fragment or a query.
    pub fn shorten(&self, uri: &str) -> Option<String> {
        let mut best: Option<(&str, &str)> = None;
        for (prefix, ns) in &self.entries {
            if uri.starts_with(ns.as_str())
                && best.map_or(true, |(_, prev_ns)| ns.len() > prev_ns.len())
            {
                best = Some((prefix.as_str(), ns.as_str()));
            }
        }
        let (prefix, ns) = best?;
        let local = &uri[ns.len()..];
        if !local.contains(['/', '#', '?']) {
            Some(format!("{prefix}:{local}"))
        } else {
            None
        }
    }

    /// Expands `prefix:local` into a full URI if the prefix is known.
    pub fn expand(&self, curie: &str) -> Option<String> {
        let (prefix, local) = curie.split_once(':')?;
        self.namespace(prefix).map(|ns| format!("{ns}{local}"))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PrefixMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = PrefixMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// The text after the last `/`, `#` or `.` of a URI, ignoring trailing
/// separators. `https://doi.org/10.1016/j.joclim.2025.100573` yields `100573`.
pub fn uri_tail(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches(['/', '#', '.']);
    trimmed
        .rsplit(['/', '#', '.'])
        .next()
        .unwrap_or(trimmed)
}

/// The fragment of a URI, or its last path segment when there is no fragment.
pub fn last_segment(uri: &str) -> Option<&str> {
    let segment = match uri.rsplit_once('#') {
        Some((_, fragment)) => fragment,
        None => uri.trim_end_matches('/').rsplit('/').next()?,
    };
    if segment.is_empty() || segment.contains(':') {
        None
    } else {
        Some(segment)
    }
}

/// The IRI a submitted value stands for under a field prefix. Values that are
/// already `http(s)` URIs are kept as they are.
pub fn prefixed_value(prefix: Option<&str>, value: &str) -> String {
    match prefix {
        Some(prefix) if !looks_like_http_uri(value) => format!("{}{}", prefix, value),
        _ => value.to_string(),
    }
}

pub fn looks_like_http_uri(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Returns the local name of a template-ontology URI. Templates in the wild use
/// `http` and `https`, and some insert a `latest/` or version path segment before
/// the term, so all of these normalise to the same local name.
pub fn template_local_name(uri: &str) -> Option<&str> {
    let https = NT_NAMESPACE;
    let http = NT_NAMESPACE.replacen("https://", "http://", 1);
    let rest = uri
        .strip_prefix(https)
        .or_else(|| uri.strip_prefix(http.as_str()))?;
    let local = rest.rsplit('/').next().unwrap_or(rest);
    if local.is_empty() {
        None
    } else {
        Some(local)
    }
}

/// Placeholder classes are discovered by suffix so that every ontology version
/// is recognised.
pub fn is_placeholder_class(uri: &str) -> bool {
    template_local_name(uri)
        .map(|local| local.ends_with("Placeholder") || local == "IntroducedResource")
        .unwrap_or(false)
}

/// Strips `namespace` from `uri` and any separator left over at the start of the
/// remainder.
pub fn strip_namespace<'a>(uri: &'a str, namespace: &str) -> Option<&'a str> {
    let rest = uri.strip_prefix(namespace)?;
    let rest = rest.trim_start_matches(['/', '#', '.']);
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}
