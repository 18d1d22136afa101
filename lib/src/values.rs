//! Option lists for restricted- and guided-choice placeholders.
//!
//! A placeholder's `nt:possibleValuesFrom` points at a nanopublication (or any
//! TriG document) listing the controlled values. Each labelled resource of that
//! document becomes one [`FieldOption`].

use crate::consts::{COMMENT, DESCRIPTION, LABEL};
use crate::document::{DocumentLocation, RdfDocument};
use crate::fetch::FetchOptions;
use crate::labels::LabelCache;
use crate::nanopub::extract_graphs;
use anyhow::Result;
use log::debug;
use oxigraph::model::{NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub name: String,
    pub description: Option<String>,
    pub uri: Option<String>,
}

/// Something that can turn a possible-values URI into options.
pub trait PossibleValuesSource: Send + Sync {
    fn fetch(&self, uri: &str) -> Result<Vec<FieldOption>>;
}

/// Fetches option documents over HTTP as TriG.
pub struct HttpValuesSource {
    options: FetchOptions,
    labels: LabelCache,
}

impl HttpValuesSource {
    pub fn new(options: FetchOptions, labels: LabelCache) -> Self {
        Self { options, labels }
    }
}

impl PossibleValuesSource for HttpValuesSource {
    fn fetch(&self, uri: &str) -> Result<Vec<FieldOption>> {
        let document = RdfDocument::load(DocumentLocation::Url(uri.to_string()), &self.options)?;
        let options = options_from_document(&document);
        for option in &options {
            if let Some(uri) = &option.uri {
                self.labels.insert(uri.as_str(), option.name.as_str());
            }
        }
        Ok(options)
    }
}

/// Reads `(resource, rdfs:label, name)` pairs, with an optional
/// `dcterms:description` or `rdfs:comment`, sorted by name. When the document
/// is a nanopublication only its assertion graph is considered.
pub fn options_from_document(document: &RdfDocument) -> Vec<FieldOption> {
    let assertion = extract_graphs(document).ok().map(|g| g.assertion);
    let graph = assertion.as_deref().map(NamedNodeRef::new_unchecked);
    let mut options: Vec<FieldOption> = Vec::new();
    for quad in document.match_predicate(graph, LABEL) {
        let (NamedOrBlankNodeRef::NamedNode(subject), TermRef::Literal(label)) =
            (quad.subject, quad.object)
        else {
            continue;
        };
        if options
            .iter()
            .any(|o| o.uri.as_deref() == Some(subject.as_str()))
        {
            continue;
        }
        let description = document
            .literal_value(graph, subject.into(), DESCRIPTION)
            .or_else(|| document.literal_value(graph, subject.into(), COMMENT));
        options.push(FieldOption {
            name: label.value().to_string(),
            description,
            uri: Some(subject.as_str().to_string()),
        });
    }
    options.sort_by(|a, b| a.name.cmp(&b.name).then(a.uri.cmp(&b.uri)));
    debug!("Read {} options from {}", options.len(), document.location());
    options
}
