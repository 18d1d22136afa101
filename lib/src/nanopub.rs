//! Defines the `Nanopub` store: a parsed nanopublication with its four graph URIs
//! located and its summary metadata derived from the pubinfo and assertion graphs.

use crate::config::Config;
use crate::consts::*;
use crate::document::{DocumentLocation, RdfDocument};
use crate::errors::NanopubError;
use crate::labels::{LabelCache, LabelChain, LabelContext, LabelLookup};
use crate::terms::last_segment;
use anyhow::{anyhow, Result};
use chrono::prelude::*;
use log::{debug, info, warn};
use oxigraph::model::{
    GraphNameRef, NamedNode, NamedNodeRef, NamedOrBlankNodeRef, QuadRef, TermRef,
};
use serde::Serialize;
use std::collections::HashSet;

/// The four named graphs of a nanopublication and the nanopublication URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NanopubGraphs {
    pub uri: String,
    pub head: String,
    pub assertion: String,
    pub provenance: String,
    pub pubinfo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Creator {
    pub uri: String,
    pub name: Option<String>,
}

/// Read-only projection over the quad set, recomputed on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct NanopubMetadata {
    pub created: Option<DateTime<Utc>>,
    pub creators: Vec<Creator>,
    pub title: Option<String>,
    pub license: Option<String>,
    pub types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Nanopub {
    document: RdfDocument,
    graphs: NanopubGraphs,
    metadata: NanopubMetadata,
    labels: LabelCache,
}

impl std::fmt::Display for Nanopub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Nanopublication: {}", self.graphs.uri)?;
        writeln!(f, "Location: {}", self.document.location())?;
        writeln!(f, "  Head: {}", self.graphs.head)?;
        writeln!(f, "  Assertion: {}", self.graphs.assertion)?;
        writeln!(f, "  Provenance: {}", self.graphs.provenance)?;
        writeln!(f, "  Pubinfo: {}", self.graphs.pubinfo)?;
        if let Some(title) = &self.metadata.title {
            writeln!(f, "Title: {}", title)?;
        }
        if let Some(created) = &self.metadata.created {
            writeln!(f, "Created: {}", created.to_rfc3339())?;
        }
        for creator in &self.metadata.creators {
            match &creator.name {
                Some(name) => writeln!(f, "Creator: {} <{}>", name, creator.uri)?,
                None => writeln!(f, "Creator: <{}>", creator.uri)?,
            }
        }
        if let Some(license) = &self.metadata.license {
            writeln!(f, "License: {}", license)?;
        }
        for t in &self.metadata.types {
            writeln!(f, "Type: {}", t)?;
        }
        Ok(())
    }
}

impl Nanopub {
    /// Loads a nanopublication from a URL or file.
    pub fn load(location: DocumentLocation, config: &Config, labels: &LabelCache) -> Result<Self> {
        let document = RdfDocument::load(location, &config.fetch_options())?;
        Self::from_document(document, labels.clone())
    }

    /// Loads a nanopublication from TriG text.
    pub fn load_str(text: &str, labels: &LabelCache) -> Result<Self> {
        let document = RdfDocument::parse_str(text)?;
        Self::from_document(document, labels.clone())
    }

    pub fn from_document(document: RdfDocument, labels: LabelCache) -> Result<Self> {
        let graphs = extract_graphs(&document)?;
        harvest_labels(&document, &labels);
        let mut nanopub = Nanopub {
            document,
            graphs,
            metadata: NanopubMetadata::default(),
            labels,
        };
        nanopub.metadata = nanopub.extract_metadata();
        info!(
            "Loaded nanopublication {} ({} quads)",
            nanopub.graphs.uri,
            nanopub.document.len()
        );
        Ok(nanopub)
    }

    pub fn uri(&self) -> &str {
        &self.graphs.uri
    }

    pub fn graphs(&self) -> &NanopubGraphs {
        &self.graphs
    }

    pub fn metadata(&self) -> &NanopubMetadata {
        &self.metadata
    }

    pub fn document(&self) -> &RdfDocument {
        &self.document
    }

    pub fn labels(&self) -> &LabelCache {
        &self.labels
    }

    pub fn uri_node(&self) -> NamedNodeRef<'_> {
        NamedNodeRef::new_unchecked(&self.graphs.uri)
    }

    pub fn assertion_graph(&self) -> NamedNodeRef<'_> {
        NamedNodeRef::new_unchecked(&self.graphs.assertion)
    }

    pub fn pubinfo_graph(&self) -> NamedNodeRef<'_> {
        NamedNodeRef::new_unchecked(&self.graphs.pubinfo)
    }

    /// The document's own URI as declared by its `this:` prefix, falling back
    /// to the nanopublication URI from the head graph.
    pub fn this_uri(&self) -> &str {
        self.document
            .prefixes()
            .namespace("this")
            .unwrap_or(&self.graphs.uri)
    }

    /// Namespace of the document's sub-resources, from the `sub:` prefix or
    /// derived from the nanopublication URI.
    pub fn sub_namespace(&self) -> String {
        match self.document.prefixes().namespace("sub") {
            Some(ns) => ns.to_string(),
            None => format!("{}/", self.graphs.uri),
        }
    }

    pub fn assertion_quads(&self) -> Vec<QuadRef<'_>> {
        self.document.graph_quads(self.assertion_graph())
    }

    pub fn label_context(&self) -> LabelContext<'_> {
        LabelContext::new(&self.labels)
            .with_document(&self.document)
            .with_local_namespace(self.sub_namespace())
            .with_local_namespace(format!("{}#", self.graphs.uri))
    }

    pub fn find_internal_label(&self, uri: &str) -> LabelLookup {
        LabelChain::standard().resolve(uri, &self.label_context())
    }

    /// Like [`Nanopub::find_internal_label`] but always yields text; external
    /// references fall back to their last segment.
    pub fn display_label(&self, uri: &str) -> String {
        match self.find_internal_label(uri) {
            LabelLookup::Found(label) => label,
            LabelLookup::External => last_segment(uri).unwrap_or(uri).to_string(),
        }
    }

    /// The assertion graph's root resource: the graph URI itself when it is
    /// described, otherwise the smallest subject that is never an object.
    pub fn assertion_subject(&self) -> Option<NamedOrBlankNodeRef<'_>> {
        let graph = self.assertion_graph();
        let quads = self.assertion_quads();
        if quads
            .iter()
            .any(|q| q.subject == NamedOrBlankNodeRef::NamedNode(graph))
        {
            return Some(graph.into());
        }
        let objects: HashSet<String> = quads.iter().map(|q| q.object.to_string()).collect();
        let mut roots: Vec<NamedOrBlankNodeRef<'_>> = quads
            .iter()
            .map(|q| q.subject)
            .filter(|s| !objects.contains(&s.to_string()))
            .collect();
        if roots.is_empty() {
            roots = quads.iter().map(|q| q.subject).collect();
        }
        roots.sort_by_key(|s| s.to_string());
        roots.into_iter().next()
    }

    fn extract_metadata(&self) -> NanopubMetadata {
        let doc = &self.document;
        let np = self.uri_node();
        let pubinfo = Some(self.pubinfo_graph());

        let created = doc
            .literal_value(pubinfo, np.into(), CREATED)
            .and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    warn!("Unparseable dcterms:created '{}' on {}: {}", raw, np, e);
                    None
                }
            });

        let mut creator_uris: Vec<String> = Vec::new();
        for predicate in [CREATOR, CREATED_BY] {
            for term in doc.objects(pubinfo, np.into(), predicate) {
                if let TermRef::NamedNode(n) = term {
                    creator_uris.push(n.as_str().to_string());
                }
            }
        }
        creator_uris.sort();
        creator_uris.dedup();
        let creators = creator_uris
            .into_iter()
            .map(|uri| {
                let name = self.find_internal_label(&uri).found();
                Creator { uri, name }
            })
            .collect();

        let title = doc
            .literal_value(pubinfo, np.into(), TITLE)
            .or_else(|| doc.literal_value(pubinfo, np.into(), LABEL));

        let license = doc
            .match_one(pubinfo, np.into(), LICENSE)
            .and_then(|t| match t {
                TermRef::NamedNode(n) => Some(n.as_str().to_string()),
                TermRef::Literal(l) => Some(l.value().to_string()),
                _ => None,
            });

        let mut types: Vec<String> = Vec::new();
        if let Some(subject) = self.assertion_subject() {
            for term in doc.objects(Some(self.assertion_graph()), subject, TYPE) {
                if let TermRef::NamedNode(n) = term {
                    types.push(n.as_str().to_string());
                }
            }
        }
        if let Ok(this) = NamedNodeRef::new(self.this_uri()) {
            for term in doc.objects(pubinfo, this.into(), HAS_NANOPUB_TYPE) {
                if let TermRef::NamedNode(n) = term {
                    types.push(n.as_str().to_string());
                }
            }
        }
        let mut seen = HashSet::new();
        types.retain(|t| seen.insert(t.clone()));

        NanopubMetadata {
            created,
            creators,
            title,
            license,
            types,
        }
    }
}

/// Locates the head graph through `(N, rdf:type, np:Nanopublication, H)` and
/// reads the assertion, provenance and pubinfo graph URIs off the head graph.
/// Each linkage must occur exactly once.
pub fn extract_graphs(document: &RdfDocument) -> Result<NanopubGraphs> {
    let mut heads: Vec<(NamedNode, NamedNode)> = Vec::new();
    for quad in document.match_predicate(None, TYPE) {
        if quad.object != TermRef::NamedNode(NANOPUBLICATION) {
            continue;
        }
        let (NamedOrBlankNodeRef::NamedNode(np), GraphNameRef::NamedNode(g)) =
            (quad.subject, quad.graph_name)
        else {
            continue;
        };
        let entry = (np.into_owned(), g.into_owned());
        if !heads.contains(&entry) {
            heads.push(entry);
        }
    }
    let (np, head) = match heads.len() {
        0 => {
            return Err(anyhow!(NanopubError::malformed(
                "no (N, rdf:type, np:Nanopublication) quad in a named graph"
            )))
        }
        1 => heads.remove(0),
        n => {
            return Err(anyhow!(NanopubError::malformed(format!(
                "{} nanopublication declarations found",
                n
            ))))
        }
    };
    debug!("Found nanopublication {} with head graph {}", np, head);

    let linked = |predicate: NamedNodeRef<'_>, what: &str| -> Result<String> {
        let targets: Vec<String> = document
            .objects(Some(head.as_ref()), np.as_ref().into(), predicate)
            .into_iter()
            .filter_map(|t| match t {
                TermRef::NamedNode(n) => Some(n.as_str().to_string()),
                _ => None,
            })
            .collect();
        match targets.len() {
            1 => Ok(targets[0].clone()),
            0 => Err(anyhow!(NanopubError::malformed(format!(
                "head graph {} has no {} link",
                head, what
            )))),
            n => Err(anyhow!(NanopubError::malformed(format!(
                "head graph {} has {} {} links",
                head, n, what
            )))),
        }
    };

    Ok(NanopubGraphs {
        assertion: linked(HAS_ASSERTION, "np:hasAssertion")?,
        provenance: linked(HAS_PROVENANCE, "np:hasProvenance")?,
        pubinfo: linked(HAS_PUBLICATION_INFO, "np:hasPublicationInfo")?,
        uri: np.as_str().to_string(),
        head: head.as_str().to_string(),
    })
}

/// Feeds every `foaf:name` and `rdfs:label` of a named resource into the shared
/// label cache.
fn harvest_labels(document: &RdfDocument, labels: &LabelCache) {
    for predicate in [FOAF_NAME, LABEL] {
        for quad in document.match_predicate(None, predicate) {
            if let (NamedOrBlankNodeRef::NamedNode(s), TermRef::Literal(l)) =
                (quad.subject, quad.object)
            {
                labels.insert(s.as_str(), l.value());
            }
        }
    }
}
