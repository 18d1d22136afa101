//! Loading TriG documents into an indexed in-memory quad set.
//!
//! A [`RdfDocument`] keeps the parsed [`Dataset`] together with every prefix the
//! source declared, and offers the small set of typed pattern queries the
//! nanopublication and template layers need.

use crate::errors::NanopubError;
use crate::fetch::{fetch_trig, FetchOptions};
use crate::terms::PrefixMap;
use anyhow::{anyhow, Result};
use log::{debug, info};
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{
    Dataset, GraphNameRef, NamedNodeRef, NamedOrBlankNodeRef, QuadRef, TermRef,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a document came from.
#[derive(Serialize, Deserialize, Hash, Clone, Eq, PartialEq, Debug)]
pub enum DocumentLocation {
    #[serde(rename = "file")]
    File(PathBuf),
    #[serde(rename = "url")]
    Url(String),
    #[serde(rename = "inline")]
    InMemory,
}

impl std::fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentLocation::File(p) => write!(f, "file://{}", p.display()),
            DocumentLocation::Url(u) => write!(f, "{}", u),
            DocumentLocation::InMemory => write!(f, "<inline>"),
        }
    }
}

impl DocumentLocation {
    pub fn from_str(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            DocumentLocation::Url(s.to_string())
        } else {
            DocumentLocation::File(PathBuf::from(s.trim_start_matches("file://")))
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, DocumentLocation::Url(_))
    }

    /// Reads the raw text behind this location.
    pub fn read(&self, opts: &FetchOptions) -> Result<String> {
        match self {
            DocumentLocation::File(p) => read_file(p),
            DocumentLocation::Url(u) => Ok(fetch_trig(u, opts)?.body),
            DocumentLocation::InMemory => Err(anyhow!(
                "In-memory documents cannot be re-read from a source"
            )),
        }
    }
}

pub fn read_file(file: &Path) -> Result<String> {
    debug!("Reading file: {}", file.display());
    Ok(std::fs::read_to_string(file)?)
}

/// A parsed TriG document.
#[derive(Debug, Clone)]
pub struct RdfDocument {
    dataset: Dataset,
    prefixes: PrefixMap,
    location: DocumentLocation,
}

impl RdfDocument {
    /// Parses TriG text. Fails with [`NanopubError::Parse`] on the first syntax
    /// error; no partial document is returned.
    pub fn parse(text: &str, location: DocumentLocation) -> Result<Self> {
        let mut parser = RdfParser::from_format(RdfFormat::TriG);
        if let DocumentLocation::Url(url) = &location {
            parser = parser.with_base_iri(url.as_str()).map_err(|e| {
                anyhow!(NanopubError::Parse {
                    source_name: location.to_string(),
                    message: e.to_string(),
                })
            })?;
        }
        let mut reader = parser.for_reader(std::io::Cursor::new(text.as_bytes()));
        let mut dataset = Dataset::new();
        for quad in reader.by_ref() {
            let quad = quad.map_err(|e| {
                anyhow!(NanopubError::Parse {
                    source_name: location.to_string(),
                    message: e.to_string(),
                })
            })?;
            dataset.insert(&quad);
        }
        let prefixes: PrefixMap = reader.prefixes().collect();
        debug!(
            "Parsed {} quads and {} prefixes from {}",
            dataset.len(),
            prefixes.len(),
            location
        );
        Ok(RdfDocument {
            dataset,
            prefixes,
            location,
        })
    }

    pub fn parse_str(text: &str) -> Result<Self> {
        Self::parse(text, DocumentLocation::InMemory)
    }

    /// Reads and parses the document behind `location`.
    pub fn load(location: DocumentLocation, opts: &FetchOptions) -> Result<Self> {
        info!("Loading document from {}", location);
        let text = location.read(opts)?;
        Self::parse(&text, location)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    pub fn location(&self) -> &DocumentLocation {
        &self.location
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// All quads of the named graph `graph`.
    pub fn graph_quads(&self, graph: NamedNodeRef<'_>) -> Vec<QuadRef<'_>> {
        self.dataset
            .quads_for_graph_name(GraphNameRef::NamedNode(graph))
            .collect()
    }

    /// Objects of `(subject, predicate, ?)`, restricted to `graph` when given.
    pub fn objects<'a>(
        &'a self,
        graph: Option<NamedNodeRef<'_>>,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Vec<TermRef<'a>> {
        self.dataset
            .quads_for_subject(subject)
            .filter(|q| q.predicate == predicate && in_graph(q, graph))
            .map(|q| q.object)
            .collect()
    }

    /// Subjects of `(?, predicate, object)`, restricted to `graph` when given.
    pub fn subjects<'a>(
        &'a self,
        graph: Option<NamedNodeRef<'_>>,
        predicate: NamedNodeRef<'_>,
        object: TermRef<'_>,
    ) -> Vec<NamedOrBlankNodeRef<'a>> {
        self.dataset
            .quads_for_object(object)
            .filter(|q| q.predicate == predicate && in_graph(q, graph))
            .map(|q| q.subject)
            .collect()
    }

    /// Every quad using `predicate`, restricted to `graph` when given.
    pub fn match_predicate<'a>(
        &'a self,
        graph: Option<NamedNodeRef<'_>>,
        predicate: NamedNodeRef<'_>,
    ) -> Vec<QuadRef<'a>> {
        self.dataset
            .quads_for_predicate(predicate)
            .filter(|q| in_graph(q, graph))
            .collect()
    }

    /// At most one object of `(subject, predicate, ?)`. When several candidates
    /// exist the lexically smallest is returned, which keeps repeated loads of
    /// the same text stable.
    pub fn match_one<'a>(
        &'a self,
        graph: Option<NamedNodeRef<'_>>,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Option<TermRef<'a>> {
        let mut objects = self.objects(graph, subject, predicate);
        if objects.len() > 1 {
            debug!(
                "{} candidates for {} {}, picking one",
                objects.len(),
                subject,
                predicate
            );
            objects.sort_by_key(|t| t.to_string());
        }
        objects.into_iter().next()
    }

    /// Lexical value of the first literal object of `(subject, predicate, ?)`.
    pub fn literal_value(
        &self,
        graph: Option<NamedNodeRef<'_>>,
        subject: NamedOrBlankNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> Option<String> {
        let mut values: Vec<String> = self
            .objects(graph, subject, predicate)
            .into_iter()
            .filter_map(|t| match t {
                TermRef::Literal(l) => Some(l.value().to_string()),
                _ => None,
            })
            .collect();
        values.sort();
        values.into_iter().next()
    }
}

fn in_graph(quad: &QuadRef<'_>, graph: Option<NamedNodeRef<'_>>) -> bool {
    match graph {
        Some(g) => quad.graph_name == GraphNameRef::NamedNode(g),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::NamedNodeRef;

    const DOC: &str = r#"
@prefix ex: <http://example.org/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
ex:g1 { ex:a rdfs:label "A" ; ex:p ex:b , ex:c . }
ex:g2 { ex:a rdfs:label "A2" . }
"#;

    #[test]
    fn test_parse_collects_prefixes() {
        let doc = RdfDocument::parse_str(DOC).unwrap();
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.prefixes().namespace("ex"), Some("http://example.org/"));
        assert_eq!(doc.location(), &DocumentLocation::InMemory);
    }

    #[test]
    fn test_graph_restricted_queries() {
        let doc = RdfDocument::parse_str(DOC).unwrap();
        let a = NamedNodeRef::new("http://example.org/a").unwrap();
        let g1 = NamedNodeRef::new("http://example.org/g1").unwrap();
        let p = NamedNodeRef::new("http://example.org/p").unwrap();
        let label = NamedNodeRef::new("http://www.w3.org/2000/01/rdf-schema#label").unwrap();
        assert_eq!(doc.objects(Some(g1), a.into(), p).len(), 2);
        assert_eq!(doc.objects(None, a.into(), label).len(), 2);
        assert_eq!(
            doc.literal_value(Some(g1), a.into(), label).as_deref(),
            Some("A")
        );
        // ambiguous lookups resolve to the same candidate every time
        let first = doc.match_one(Some(g1), a.into(), p).map(|t| t.to_string());
        assert_eq!(first.as_deref(), Some("<http://example.org/b>"));
        assert_eq!(doc.graph_quads(g1).len(), 3);
    }

    #[test]
    fn test_parse_error_is_typed() {
        let err = RdfDocument::parse_str("ex:a ex:b .").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NanopubError>(),
            Some(NanopubError::Parse { .. })
        ));
    }

    #[test]
    fn test_location_from_str() {
        assert!(DocumentLocation::from_str("https://w3id.org/np/RA1").is_url());
        assert_eq!(
            DocumentLocation::from_str("file:///tmp/a.trig"),
            DocumentLocation::File(PathBuf::from("/tmp/a.trig"))
        );
    }
}
