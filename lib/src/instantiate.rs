//! Instantiates a template into a new, unsigned nanopublication.
//!
//! The generated nanopublication carries the placeholder URI
//! `base_uri + "placeholder"`; the permanent trusty URI is assigned by the
//! external [`Signer`]. For fixed values, publication data (including the
//! timestamp) and template, the quad set and its TriG text are reproducible
//! byte for byte.

use crate::config::Config;
use crate::consts::*;
use crate::errors::NanopubError;
use crate::nanopub::NanopubGraphs;
use crate::template::{PlaceholderType, StatementTerm, Template, TemplateField};
use crate::terms::{looks_like_http_uri, prefixed_value, uri_tail, PrefixMap};
use crate::trig::TrigWriter;
use anyhow::{anyhow, Context, Result};
use chrono::prelude::*;
use log::{debug, info, warn};
use oxigraph::model::vocab::xsd;
use oxigraph::model::{
    BlankNode, GraphName, Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, Quad, Term,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A submitted value: one string, or a list for repeatable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    List(Vec<String>),
}

impl FieldValue {
    /// The value substituted into a statement. Lists contribute their first
    /// element since statements are emitted once.
    pub fn first(&self) -> Option<&str> {
        match self {
            FieldValue::Single(s) => Some(s.as_str()),
            FieldValue::List(items) => items.first().map(String::as_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

/// Field id → submitted value.
pub type TemplateValues = BTreeMap<String, FieldValue>;

/// Who publishes, and under which terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubData {
    /// ORCID URI or bare ORCID identifier
    pub orcid: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub license: Option<String>,
    pub base_uri: Option<String>,
    /// Defaults to the current time
    pub timestamp: Option<DateTime<Utc>>,
    pub is_example: bool,
}

impl PubData {
    /// The ORCID as a URI; bare identifiers are placed under `https://orcid.org/`.
    pub fn orcid_uri(&self) -> Option<String> {
        let orcid = self.orcid.as_deref()?.trim();
        if orcid.is_empty() {
            None
        } else if looks_like_http_uri(orcid) {
            Some(orcid.to_string())
        } else {
            Some(format!("https://orcid.org/{}", orcid))
        }
    }
}

/// An unsigned nanopublication produced from a template.
#[derive(Debug, Clone)]
pub struct GeneratedNanopub {
    pub graphs: NanopubGraphs,
    pub quads: Vec<Quad>,
    pub prefixes: PrefixMap,
    pub trig: String,
}

impl GeneratedNanopub {
    pub fn uri(&self) -> &str {
        &self.graphs.uri
    }

    pub fn graph_quads(&self, graph: &str) -> Vec<&Quad> {
        self.quads
            .iter()
            .filter(|q| matches!(&q.graph_name, GraphName::NamedNode(n) if n.as_str() == graph))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedNanopub {
    pub signed_rdf: String,
    /// Final, trusty-URI-bearing nanopublication URI
    pub source_uri: String,
}

/// External signing routine. It receives the unsigned TriG and returns the
/// signed document with its final URI.
pub trait Signer: Send + Sync {
    fn sign(
        &self,
        trig: &str,
        private_key_pem: &str,
        orcid: &str,
        name: &str,
    ) -> Result<SignedNanopub>;
}

impl Template {
    /// Builds the four graphs of a new nanopublication from `values`. Values
    /// missing for a referenced placeholder leave the placeholder URI in place;
    /// required-ness is checked by [`crate::schema::ValidationSchema`].
    pub fn instantiate(
        &self,
        values: &TemplateValues,
        pub_data: &PubData,
        config: &Config,
    ) -> Result<GeneratedNanopub> {
        let base_uri = pub_data.base_uri.as_deref().unwrap_or(&config.base_uri);
        let uri = format!("{}placeholder", base_uri);
        let graphs = NanopubGraphs {
            head: format!("{}/Head", uri),
            assertion: format!("{}/assertion", uri),
            provenance: format!("{}/provenance", uri),
            pubinfo: format!("{}/pubinfo", uri),
            uri,
        };
        let mut assembly = Assembly::new(&graphs)?;

        assembly.head();
        for statement in self.statements() {
            let subject = self.substitute(&statement.subject, values, &assembly.sub, false);
            let predicate = self.substitute(&statement.predicate, values, &assembly.sub, false);
            let object = self.substitute(&statement.object, values, &assembly.sub, true);
            let (Some(subject), Some(predicate), Some(object)) = (subject, predicate, object)
            else {
                warn!("Statement {} cannot be emitted; skipping", statement.id);
                continue;
            };
            let subject = match subject {
                Term::NamedNode(n) => NamedOrBlankNode::from(n),
                Term::BlankNode(b) => NamedOrBlankNode::from(b),
                _ => {
                    warn!("Statement {} has a literal subject; skipping", statement.id);
                    continue;
                }
            };
            let Term::NamedNode(predicate) = predicate else {
                warn!("Statement {} has a non-IRI predicate; skipping", statement.id);
                continue;
            };
            assembly.push_assertion(subject, predicate, object);
        }

        let orcid = match pub_data.orcid_uri() {
            Some(o) => match NamedNode::new(o.as_str()) {
                Ok(node) => Some(node),
                Err(e) => {
                    warn!("Ignoring invalid ORCID {}: {}", o, e);
                    None
                }
            },
            None => None,
        };
        if let Some(orcid) = &orcid {
            let assertion = assembly.assertion.clone();
            let provenance = assembly.provenance.clone();
            assembly.push(
                assertion,
                WAS_ATTRIBUTED_TO.into_owned(),
                orcid.clone(),
                &provenance,
            );
        }

        self.pubinfo(&mut assembly, values, pub_data, config, orcid.as_ref());

        let mut prefixes = PrefixMap::new();
        prefixes.insert("this", graphs.uri.as_str());
        prefixes.insert("sub", assembly.sub.as_str());
        for (prefix, ns) in OUTPUT_PREFIXES {
            prefixes.insert(prefix, ns);
        }
        let trig = TrigWriter::new(prefixes.clone()).to_trig(&assembly.quads)?;
        info!(
            "Instantiated template {} into {} quads",
            self.uri(),
            assembly.quads.len()
        );
        Ok(GeneratedNanopub {
            graphs,
            quads: assembly.quads,
            prefixes,
            trig,
        })
    }

    /// Instantiates the template and hands the TriG to `signer`.
    pub fn apply_template(
        &self,
        values: &TemplateValues,
        pub_data: &PubData,
        config: &Config,
        private_key_pem: &str,
        signer: &dyn Signer,
    ) -> Result<SignedNanopub> {
        let generated = self.instantiate(values, pub_data, config)?;
        let orcid = pub_data.orcid_uri().unwrap_or_default();
        let name = pub_data.name.clone().unwrap_or_default();
        signer
            .sign(&generated.trig, private_key_pem, &orcid, &name)
            .with_context(|| format!("Failed to sign nanopublication {}", generated.uri()))
    }

    fn pubinfo(
        &self,
        assembly: &mut Assembly,
        values: &TemplateValues,
        pub_data: &PubData,
        config: &Config,
        orcid: Option<&NamedNode>,
    ) {
        let np = assembly.np.clone();
        let pubinfo = assembly.pubinfo.clone();

        if pub_data.is_example {
            assembly.push(np.clone(), HAS_NANOPUB_TYPE.into_owned(), EXAMPLE_NANOPUB.into_owned(), &pubinfo);
        }
        if let Some(orcid) = orcid {
            if let Some(name) = pub_data.name.as_deref().filter(|n| !n.is_empty()) {
                assembly.push(orcid.clone(), FOAF_NAME.into_owned(), Literal::new_simple_literal(name), &pubinfo);
            }
            if let Some(email) = pub_data.email.as_deref().filter(|e| !e.is_empty()) {
                match NamedNode::new(format!("mailto:{}", email)) {
                    Ok(mbox) => assembly.push(orcid.clone(), FOAF_MBOX.into_owned(), mbox, &pubinfo),
                    Err(e) => warn!("Ignoring invalid email {}: {}", email, e),
                }
            }
            assembly.push(np.clone(), SIGNED_BY.into_owned(), orcid.clone(), &pubinfo);
            assembly.push(np.clone(), CREATOR.into_owned(), orcid.clone(), &pubinfo);
        }

        let timestamp = pub_data.timestamp.unwrap_or_else(Utc::now);
        assembly.push(
            np.clone(),
            CREATED.into_owned(),
            Literal::new_typed_literal(
                timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                xsd::DATE_TIME,
            ),
            &pubinfo,
        );

        let license = pub_data
            .license
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(&config.default_license);
        match NamedNode::new(license) {
            Ok(license) => assembly.push(np.clone(), LICENSE.into_owned(), license, &pubinfo),
            Err(e) => warn!("Ignoring invalid license {}: {}", license, e),
        }

        for target in &self.metadata().target_nanopub_types {
            if let Ok(target) = NamedNode::new(target.as_str()) {
                assembly.push(np.clone(), HAS_NANOPUB_TYPE.into_owned(), target, &pubinfo);
            }
        }

        match NamedNode::new(config.platform_uri.as_str()) {
            Ok(platform) => assembly.push(np.clone(), WAS_CREATED_AT.into_owned(), platform, &pubinfo),
            Err(e) => warn!("Ignoring invalid platform URI {}: {}", config.platform_uri, e),
        }

        if let Some(pattern) = &self.metadata().label_pattern {
            let label = render_label(pattern, values);
            debug!("Nanopublication label: {}", label);
            assembly.push(np.clone(), LABEL.into_owned(), Literal::new_simple_literal(label), &pubinfo);
        }

        if let Ok(template) = NamedNode::new(self.uri()) {
            assembly.push(np, NT_WAS_CREATED_FROM_TEMPLATE.into_owned(), template, &pubinfo);
        }
    }

    /// The term emitted for one position of a statement pattern.
    fn substitute(
        &self,
        term: &StatementTerm,
        values: &TemplateValues,
        sub: &str,
        object: bool,
    ) -> Option<Term> {
        let uri = match term {
            StatementTerm::Literal {
                value,
                datatype,
                language,
            } => {
                let literal = match language {
                    Some(lang) => Literal::new_language_tagged_literal(value.as_str(), lang.as_str())
                        .unwrap_or_else(|_| Literal::new_simple_literal(value.as_str())),
                    None => Literal::new_typed_literal(
                        value.as_str(),
                        NamedNodeRef::new_unchecked(datatype),
                    ),
                };
                return Some(literal.into());
            }
            StatementTerm::Uri { uri } | StatementTerm::Field { uri, .. } => uri.as_str(),
        };
        let id = term
            .field_id()
            .map(str::to_string)
            .or_else(|| self.local_id(uri));
        let value = id
            .as_deref()
            .and_then(|id| values.get(id))
            .and_then(FieldValue::first)
            .filter(|v| !v.trim().is_empty());
        match (value, id.as_deref()) {
            (Some(value), Some(id)) => Some(self.value_term(self.field(id), uri, value.trim(), sub, object)),
            _ => resource(uri),
        }
    }

    fn value_term(
        &self,
        field: Option<&TemplateField>,
        original: &str,
        value: &str,
        sub: &str,
        object: bool,
    ) -> Term {
        let kind = field.map(|f| &f.field_type);
        let literal_kind = matches!(
            kind,
            Some(PlaceholderType::Literal)
                | Some(PlaceholderType::Text)
                | Some(PlaceholderType::LongLiteral)
                | Some(PlaceholderType::Unknown(_))
        );
        if object && literal_kind {
            return Literal::new_simple_literal(value).into();
        }

        let prefix = match (field.and_then(|f| f.prefix.as_deref()), kind) {
            (Some(prefix), _) => Some(prefix),
            (None, Some(PlaceholderType::IntroducedResource)) => Some(sub),
            _ => None,
        };
        let candidate = prefixed_value(prefix, value);
        match NamedNode::new(candidate.as_str()) {
            Ok(node) => node.into(),
            Err(_) if object => Literal::new_simple_literal(value).into(),
            Err(e) => {
                warn!(
                    "Value '{}' is not a valid IRI ({}); keeping {}",
                    value, e, original
                );
                resource(original).unwrap_or_else(|| Literal::new_simple_literal(value).into())
            }
        }
    }
}

/// Replaces every `${field}` token of a label pattern. URI values contribute
/// their tail; other values are inserted verbatim. Tokens without a value are
/// left as written.
pub fn render_label(pattern: &str, values: &TemplateValues) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let key = &rest[start + 2..start + 2 + len];
        let end = start + 3 + len;
        out.push_str(&rest[..start]);
        match values.get(key).and_then(FieldValue::first) {
            Some(v) if looks_like_http_uri(v) => out.push_str(uri_tail(v)),
            Some(v) => out.push_str(v),
            None => out.push_str(&rest[start..end]),
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

fn resource(uri: &str) -> Option<Term> {
    match uri.strip_prefix("_:") {
        Some(id) => BlankNode::new(id).ok().map(Term::from),
        None => NamedNode::new(uri).ok().map(Term::from),
    }
}

/// Quads in emission order; repeated quads are dropped.
struct Assembly {
    np: NamedNode,
    sub: String,
    head: GraphName,
    assertion: NamedNode,
    provenance: GraphName,
    pubinfo: GraphName,
    quads: Vec<Quad>,
}

impl Assembly {
    fn new(graphs: &NanopubGraphs) -> Result<Self> {
        let node = |uri: &str| {
            NamedNode::new(uri).map_err(|e| {
                anyhow!(NanopubError::malformed(format!(
                    "invalid nanopublication URI {}: {}",
                    uri, e
                )))
            })
        };
        Ok(Assembly {
            np: node(&graphs.uri)?,
            sub: format!("{}/", graphs.uri),
            head: node(&graphs.head)?.into(),
            assertion: node(&graphs.assertion)?,
            provenance: node(&graphs.provenance)?.into(),
            pubinfo: node(&graphs.pubinfo)?.into(),
            quads: Vec::new(),
        })
    }

    fn head(&mut self) {
        let np = self.np.clone();
        let head = self.head.clone();
        let sub = |suffix: &str| NamedNode::new_unchecked(format!("{}{}", self.sub, suffix));
        let (assertion, provenance, pubinfo) = (sub("assertion"), sub("provenance"), sub("pubinfo"));
        self.push(np.clone(), TYPE.into_owned(), NANOPUBLICATION.into_owned(), &head);
        self.push(np.clone(), HAS_ASSERTION.into_owned(), assertion, &head);
        self.push(np.clone(), HAS_PROVENANCE.into_owned(), provenance, &head);
        self.push(np, HAS_PUBLICATION_INFO.into_owned(), pubinfo, &head);
    }

    fn push_assertion(&mut self, subject: NamedOrBlankNode, predicate: NamedNode, object: Term) {
        let graph = GraphName::NamedNode(self.assertion.clone());
        self.push(subject, predicate, object, &graph);
    }

    fn push(
        &mut self,
        subject: impl Into<NamedOrBlankNode>,
        predicate: NamedNode,
        object: impl Into<Term>,
        graph: &GraphName,
    ) {
        let quad = Quad::new(subject, predicate, object, graph.clone());
        if !self.quads.contains(&quad) {
            self.quads.push(quad);
        }
    }
}
