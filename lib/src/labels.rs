//! Human-readable labels for URIs without an ontology service.
//!
//! Resolution runs an ordered list of [`LabelResolver`] strategies and stops at
//! the first one that answers:
//!
//! 1. an explicit `foaf:name` in the document,
//! 2. the shared [`LabelCache`],
//! 3. a fixed table of well-known URIs,
//! 4. nanopublication and DOI URIs, which are reported as external,
//! 5. sub-resources of the document itself (the `this:`/`sub:` namespaces),
//! 6. the fragment or last path segment,
//! 7. prefix shortening.
//!
//! Template label patterns and CLI output depend on this precedence.

use crate::consts::*;
use crate::document::RdfDocument;
use crate::terms::{last_segment, strip_namespace, PrefixMap};
use lazy_static::lazy_static;
use log::debug;
use oxigraph::model::NamedNodeRef;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

lazy_static! {
    static ref WELL_KNOWN_LABELS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert(TYPE.as_str(), "is a");
        m.insert(LABEL.as_str(), "has label");
        m.insert(COMMENT.as_str(), "has comment");
        m.insert(CREATOR.as_str(), "creator");
        m.insert(CREATED.as_str(), "created");
        m.insert(LICENSE.as_str(), "license");
        m.insert(TITLE.as_str(), "title");
        m.insert(DESCRIPTION.as_str(), "description");
        m.insert(WAS_ATTRIBUTED_TO.as_str(), "was attributed to");
        m.insert(FOAF_NAME.as_str(), "name");
        m.insert(HAS_NANOPUB_TYPE.as_str(), "nanopub type");
        m.insert(INTRODUCES.as_str(), "introduces");
        m.insert(NANOPUBLICATION.as_str(), "Nanopublication");
        m.insert("http://purl.org/spar/cito/cites", "cites");
        m.insert(
            "http://purl.org/spar/cito/citesAsDataSource",
            "cites as data source",
        );
        m.insert(
            "http://purl.org/spar/cito/citesAsAuthority",
            "cites as authority",
        );
        m.insert("http://purl.org/spar/cito/extends", "extends");
        m.insert("http://purl.org/spar/cito/usesMethodIn", "uses method in");
        m.insert(
            "https://w3id.org/np/o/ntemplate/AssertionTemplate",
            "assertion template",
        );
        m.insert(DEFAULT_LICENSE, "CC BY 4.0");
        m.insert("https://creativecommons.org/publicdomain/zero/1.0/", "CC0 1.0");
        m
    };
}

const EXTERNAL_PREFIXES: [&str; 6] = [
    "https://w3id.org/np/",
    "http://purl.org/np/",
    "https://purl.org/np/",
    "https://doi.org/",
    "http://doi.org/",
    "http://dx.doi.org/",
];

/// Ontology namespaces nested under the nanopublication prefixes above.
const ONTOLOGY_PREFIXES: [&str; 3] = [
    "https://w3id.org/np/o/",
    "http://w3id.org/np/o/",
    "http://purl.org/np/o/",
];

/// Process- or session-wide URI → label cache. Cloning yields another handle
/// to the same map. Entries are never removed; a later insert for the same URI
/// replaces the earlier one.
#[derive(Debug, Clone, Default)]
pub struct LabelCache {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &str) -> Option<String> {
        self.inner.read().ok()?.get(uri).cloned()
    }

    pub fn insert(&self, uri: impl Into<String>, label: impl Into<String>) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(uri.into(), label.into());
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelLookup {
    Found(String),
    /// The URI names a nanopublication or DOI; its label has to be fetched.
    External,
}

impl LabelLookup {
    pub fn found(self) -> Option<String> {
        match self {
            LabelLookup::Found(label) => Some(label),
            LabelLookup::External => None,
        }
    }
}

/// Everything a strategy may consult.
pub struct LabelContext<'a> {
    pub document: Option<&'a RdfDocument>,
    pub cache: &'a LabelCache,
    /// Namespaces of the document's own sub-resources, e.g. the `sub:` prefix.
    pub local_namespaces: Vec<String>,
}

impl<'a> LabelContext<'a> {
    pub fn new(cache: &'a LabelCache) -> Self {
        LabelContext {
            document: None,
            cache,
            local_namespaces: Vec::new(),
        }
    }

    pub fn with_document(mut self, document: &'a RdfDocument) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_local_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.local_namespaces.push(namespace.into());
        self
    }
}

pub trait LabelResolver: Send + Sync {
    fn name(&self) -> &'static str;
    fn try_resolve(&self, uri: &str, ctx: &LabelContext<'_>) -> Option<LabelLookup>;
}

pub struct ExplicitName;

impl LabelResolver for ExplicitName {
    fn name(&self) -> &'static str {
        "explicit-name"
    }

    fn try_resolve(&self, uri: &str, ctx: &LabelContext<'_>) -> Option<LabelLookup> {
        let document = ctx.document?;
        let node = NamedNodeRef::new(uri).ok()?;
        document
            .literal_value(None, node.into(), FOAF_NAME)
            .map(LabelLookup::Found)
    }
}

pub struct CachedLabel;

impl LabelResolver for CachedLabel {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn try_resolve(&self, uri: &str, ctx: &LabelContext<'_>) -> Option<LabelLookup> {
        ctx.cache.get(uri).map(LabelLookup::Found)
    }
}

pub struct WellKnownLabel;

impl LabelResolver for WellKnownLabel {
    fn name(&self) -> &'static str {
        "well-known"
    }

    fn try_resolve(&self, uri: &str, _ctx: &LabelContext<'_>) -> Option<LabelLookup> {
        WELL_KNOWN_LABELS
            .get(uri)
            .map(|label| LabelLookup::Found(label.to_string()))
    }
}

pub struct ExternalReference;

impl LabelResolver for ExternalReference {
    fn name(&self) -> &'static str {
        "external-reference"
    }

    fn try_resolve(&self, uri: &str, ctx: &LabelContext<'_>) -> Option<LabelLookup> {
        // the document's own sub-resources live under the nanopub namespace too
        if ctx
            .local_namespaces
            .iter()
            .any(|ns| uri.starts_with(ns.as_str()))
        {
            return None;
        }
        if ONTOLOGY_PREFIXES.iter().any(|p| uri.starts_with(p)) {
            return None;
        }
        if EXTERNAL_PREFIXES.iter().any(|p| uri.starts_with(p)) {
            Some(LabelLookup::External)
        } else {
            None
        }
    }
}

pub struct LocalSubResource;

impl LabelResolver for LocalSubResource {
    fn name(&self) -> &'static str {
        "local-sub-resource"
    }

    fn try_resolve(&self, uri: &str, ctx: &LabelContext<'_>) -> Option<LabelLookup> {
        ctx.local_namespaces
            .iter()
            .find_map(|ns| strip_namespace(uri, ns))
            .map(|suffix| LabelLookup::Found(suffix.to_string()))
    }
}

pub struct UriTailLabel;

impl LabelResolver for UriTailLabel {
    fn name(&self) -> &'static str {
        "uri-tail"
    }

    fn try_resolve(&self, uri: &str, _ctx: &LabelContext<'_>) -> Option<LabelLookup> {
        last_segment(uri).map(|s| LabelLookup::Found(s.to_string()))
    }
}

pub struct PrefixShortening;

impl LabelResolver for PrefixShortening {
    fn name(&self) -> &'static str {
        "prefix"
    }

    fn try_resolve(&self, uri: &str, ctx: &LabelContext<'_>) -> Option<LabelLookup> {
        if let Some(short) = ctx.document.and_then(|d| d.prefixes().shorten(uri)) {
            return Some(LabelLookup::Found(short));
        }
        let known: PrefixMap = OUTPUT_PREFIXES.iter().copied().collect();
        known.shorten(uri).map(LabelLookup::Found)
    }
}

/// The ordered resolver list.
pub struct LabelChain {
    resolvers: Vec<Box<dyn LabelResolver>>,
}

impl Default for LabelChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl LabelChain {
    pub fn standard() -> Self {
        LabelChain {
            resolvers: vec![
                Box::new(ExplicitName),
                Box::new(CachedLabel),
                Box::new(WellKnownLabel),
                Box::new(ExternalReference),
                Box::new(LocalSubResource),
                Box::new(UriTailLabel),
                Box::new(PrefixShortening),
            ],
        }
    }

    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Runs the strategies in order; if none answers the URI itself is the label.
    pub fn resolve(&self, uri: &str, ctx: &LabelContext<'_>) -> LabelLookup {
        for resolver in &self.resolvers {
            if let Some(lookup) = resolver.try_resolve(uri, ctx) {
                debug!("Label for {} from {}: {:?}", uri, resolver.name(), lookup);
                return lookup;
            }
        }
        LabelLookup::Found(uri.to_string())
    }
}

/// Resolves with the standard chain.
pub fn find_internal_label(uri: &str, ctx: &LabelContext<'_>) -> LabelLookup {
    LabelChain::standard().resolve(uri, ctx)
}
