//! Extracts the field and statement model from a nanopublication template.
//!
//! A template is a nanopublication whose assertion graph is written against the
//! nanopub-template ontology. Its root resource lists statement nodes, each a
//! reified `rdf:subject`/`rdf:predicate`/`rdf:object` pattern, and its
//! placeholders are resources typed with one of the ontology's `*Placeholder`
//! classes.

use crate::consts::*;
use crate::errors::NanopubError;
use crate::nanopub::Nanopub;
use crate::terms::{is_placeholder_class, strip_namespace, template_local_name};
use crate::values::{FieldOption, PossibleValuesSource};
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use oxigraph::model::{NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

/// Kind of a fillable slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum PlaceholderType {
    Uri,
    AutoEscapeUri,
    ExternalUri,
    TrustyUri,
    RestrictedChoice,
    GuidedChoice,
    Literal,
    Text,
    LongLiteral,
    IntroducedResource,
    SequenceElement,
    RepeatableStatement,
    /// A placeholder class this version does not know, by local name.
    Unknown(String),
}

// substring → type, most specific first
const PLACEHOLDER_PATTERNS: [(&str, PlaceholderType); 12] = [
    ("RepeatableStatement", PlaceholderType::RepeatableStatement),
    ("SequenceElement", PlaceholderType::SequenceElement),
    ("IntroducedResource", PlaceholderType::IntroducedResource),
    ("RestrictedChoice", PlaceholderType::RestrictedChoice),
    ("GuidedChoice", PlaceholderType::GuidedChoice),
    ("AutoEscapeUri", PlaceholderType::AutoEscapeUri),
    ("ExternalUri", PlaceholderType::ExternalUri),
    ("TrustyUri", PlaceholderType::TrustyUri),
    ("LongLiteral", PlaceholderType::LongLiteral),
    ("Text", PlaceholderType::Text),
    ("Uri", PlaceholderType::Uri),
    ("Literal", PlaceholderType::Literal),
];

impl PlaceholderType {
    /// Maps the `rdf:type` URIs of a placeholder node to a type by substring
    /// containment on their template-ontology local names.
    pub fn classify(type_uris: &[String]) -> PlaceholderType {
        let locals: Vec<&str> = type_uris
            .iter()
            .filter_map(|uri| template_local_name(uri))
            .collect();
        for (pattern, kind) in PLACEHOLDER_PATTERNS.iter() {
            if locals.iter().any(|local| local.contains(pattern)) {
                return kind.clone();
            }
        }
        let name = locals
            .iter()
            .find(|l| l.ends_with("Placeholder"))
            .or(locals.first())
            .map(|l| l.to_string())
            .unwrap_or_else(|| type_uris.join(","));
        PlaceholderType::Unknown(name)
    }

    pub fn is_uri(&self) -> bool {
        matches!(
            self,
            PlaceholderType::Uri
                | PlaceholderType::AutoEscapeUri
                | PlaceholderType::ExternalUri
                | PlaceholderType::TrustyUri
        )
    }

    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            PlaceholderType::RestrictedChoice | PlaceholderType::GuidedChoice
        )
    }

    /// Values of these types are emitted as literals when they fill an object.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            PlaceholderType::Literal | PlaceholderType::Text | PlaceholderType::LongLiteral
        )
    }
}

impl std::fmt::Display for PlaceholderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceholderType::Unknown(name) => write!(f, "Unknown({})", name),
            other => write!(f, "{:?}", other),
        }
    }
}

/// One fillable slot of a template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateField {
    pub id: String,
    pub uri: String,
    pub label: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub field_type: PlaceholderType,
    pub required: bool,
    /// Every statement using this field is repeatable.
    pub multiple: bool,
    pub options: Vec<FieldOption>,
    pub possible_values_from: Vec<String>,
    /// A possible-values source could not be fetched and no options are known.
    pub options_unavailable: bool,
    #[serde(with = "serde_regex")]
    pub regex: Option<Regex>,
    pub prefix: Option<String>,
    pub prefix_label: Option<String>,
}

/// A term of a statement pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StatementTerm {
    Uri {
        uri: String,
    },
    Literal {
        value: String,
        datatype: String,
        language: Option<String>,
    },
    Field {
        field: String,
        uri: String,
    },
}

impl StatementTerm {
    pub fn field_id(&self) -> Option<&str> {
        match self {
            StatementTerm::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            StatementTerm::Uri { uri } | StatementTerm::Field { uri, .. } => Some(uri),
            StatementTerm::Literal { .. } => None,
        }
    }
}

/// One triple pattern the template emits into a new assertion graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub id: String,
    pub subject: StatementTerm,
    pub predicate: StatementTerm,
    pub object: StatementTerm,
    pub types: Vec<String>,
    pub optional: bool,
    pub repeatable: bool,
    /// Id of the grouped statement this one belongs to.
    pub group: Option<String>,
}

impl Statement {
    pub fn references(&self, field: &str) -> bool {
        [&self.subject, &self.predicate, &self.object]
            .iter()
            .any(|t| t.field_id() == Some(field))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateMetadata {
    pub uri: String,
    pub subject: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub types: Vec<String>,
    pub target_nanopub_types: Vec<String>,
    pub label_pattern: Option<String>,
    pub tags: Vec<String>,
    pub statement_refs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Template {
    nanopub: Nanopub,
    metadata: TemplateMetadata,
    fields: Vec<TemplateField>,
    statements: Vec<Statement>,
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Template: {}",
            self.metadata.name.as_deref().unwrap_or(&self.metadata.uri)
        )?;
        writeln!(f, "URI: {}", self.metadata.uri)?;
        if let Some(description) = &self.metadata.description {
            writeln!(f, "Description: {}", description)?;
        }
        for t in &self.metadata.target_nanopub_types {
            writeln!(f, "Target type: {}", t)?;
        }
        if let Some(pattern) = &self.metadata.label_pattern {
            writeln!(f, "Label pattern: {}", pattern)?;
        }
        writeln!(f, "Fields:")?;
        for field in &self.fields {
            writeln!(
                f,
                "  {} [{}{}] {}",
                field.id,
                field.field_type,
                if field.required { ", required" } else { "" },
                field.label
            )?;
        }
        writeln!(f, "Statements:")?;
        for st in &self.statements {
            writeln!(
                f,
                "  {}{}",
                st.id,
                if st.optional { " (optional)" } else { "" }
            )?;
        }
        Ok(())
    }
}

impl Template {
    /// Specialises a loaded nanopublication into a template. Remote option lists
    /// are not fetched here; see [`Template::resolve_options`].
    pub fn from_nanopub(nanopub: Nanopub) -> Result<Self> {
        let mut extractor = Extractor::new(&nanopub)?;
        let metadata = extractor.metadata();
        let statements = extractor.statements(&metadata.statement_refs);
        let mut fields = extractor.fields();
        compute_requirements(&mut fields, &statements);
        info!(
            "Extracted template {} with {} fields and {} statements",
            metadata.uri,
            fields.len(),
            statements.len()
        );
        Ok(Template {
            nanopub,
            metadata,
            fields,
            statements,
        })
    }

    pub fn nanopub(&self) -> &Nanopub {
        &self.nanopub
    }

    pub fn uri(&self) -> &str {
        &self.metadata.uri
    }

    pub fn metadata(&self) -> &TemplateMetadata {
        &self.metadata
    }

    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&TemplateField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statement(&self, id: &str) -> Option<&Statement> {
        self.statements.iter().find(|s| s.id == id)
    }

    /// Namespace of the template's own placeholders and statement nodes.
    pub fn sub_namespace(&self) -> String {
        self.nanopub.sub_namespace()
    }

    /// Field id for a template URI: the remainder after the template's `sub:`
    /// namespace or after its own URI.
    pub fn local_id(&self, uri: &str) -> Option<String> {
        local_id(uri, &self.sub_namespace(), self.nanopub.uri())
    }

    /// Fetches the option lists of choice placeholders. A failing source only
    /// degrades its own field; extraction as a whole never fails here.
    pub fn resolve_options(&mut self, source: &dyn PossibleValuesSource) {
        for field in self.fields.iter_mut() {
            if field.possible_values_from.is_empty() {
                continue;
            }
            let mut failed = false;
            for uri in field.possible_values_from.clone() {
                match source.fetch(&uri) {
                    Ok(options) => {
                        debug!("{} options for {} from {}", options.len(), field.id, uri);
                        merge_options(&mut field.options, options);
                    }
                    Err(e) => {
                        warn!(
                            "Could not fetch possible values for {} from {}: {}",
                            field.id, uri, e
                        );
                        failed = true;
                    }
                }
            }
            field.options_unavailable = failed && field.options.is_empty();
        }
    }
}

fn local_id(uri: &str, sub_namespace: &str, template_uri: &str) -> Option<String> {
    strip_namespace(uri, sub_namespace)
        .or_else(|| strip_namespace(uri, template_uri))
        .map(|s| s.to_string())
}

fn merge_options(existing: &mut Vec<FieldOption>, incoming: Vec<FieldOption>) {
    for option in incoming {
        let duplicate = existing.iter().any(|o| match (&o.uri, &option.uri) {
            (Some(a), Some(b)) => a == b,
            _ => o.name == option.name,
        });
        if !duplicate {
            existing.push(option);
        }
    }
}

/// `required` is false only for placeholders that fill the object of an
/// optional statement and appear in no non-optional statement.
fn compute_requirements(fields: &mut [TemplateField], statements: &[Statement]) {
    for field in fields.iter_mut() {
        let optional_object = statements
            .iter()
            .any(|s| s.optional && s.object.field_id() == Some(field.id.as_str()));
        let in_mandatory = statements
            .iter()
            .any(|s| !s.optional && s.references(&field.id));
        field.required = !(optional_object && !in_mandatory);

        let using: Vec<&Statement> = statements
            .iter()
            .filter(|s| s.references(&field.id))
            .collect();
        field.multiple = !using.is_empty() && using.iter().all(|s| s.repeatable);
    }
}

struct Extractor<'a> {
    nanopub: &'a Nanopub,
    assertion: NamedNodeRef<'a>,
    root: NamedOrBlankNodeRef<'a>,
    sub_namespace: String,
    placeholders: Vec<(String, Vec<String>)>,
}

impl<'a> Extractor<'a> {
    fn new(nanopub: &'a Nanopub) -> Result<Self> {
        let root = nanopub.assertion_subject().ok_or_else(|| {
            anyhow!(NanopubError::malformed(format!(
                "template {} has an empty assertion graph",
                nanopub.uri()
            )))
        })?;
        let mut extractor = Extractor {
            nanopub,
            assertion: nanopub.assertion_graph(),
            root,
            sub_namespace: nanopub.sub_namespace(),
            placeholders: Vec::new(),
        };
        extractor.placeholders = extractor.discover_placeholders();
        Ok(extractor)
    }

    fn graph(&self) -> Option<NamedNodeRef<'a>> {
        Some(self.assertion)
    }

    fn named_objects(&self, subject: NamedOrBlankNodeRef<'_>, predicate: NamedNodeRef<'_>) -> Vec<String> {
        self.nanopub
            .document()
            .objects(self.graph(), subject, predicate)
            .into_iter()
            .filter_map(|t| match t {
                TermRef::NamedNode(n) => Some(n.as_str().to_string()),
                _ => None,
            })
            .collect()
    }

    fn literal(&self, subject: NamedOrBlankNodeRef<'_>, predicate: NamedNodeRef<'_>) -> Option<String> {
        self.nanopub
            .document()
            .literal_value(self.graph(), subject, predicate)
    }

    fn metadata(&self) -> TemplateMetadata {
        let root = self.root;
        let mut statement_refs = Vec::new();
        for predicate in [NT_HAS_STATEMENT, NT_INCLUDES] {
            for term in self.nanopub.document().objects(self.graph(), root, predicate) {
                let id = term_key(term);
                if !statement_refs.contains(&id) {
                    statement_refs.push(id);
                }
            }
        }
        TemplateMetadata {
            uri: self.nanopub.uri().to_string(),
            subject: node_key(root),
            name: self.literal(root, LABEL),
            description: self
                .literal(root, DESCRIPTION)
                .or_else(|| self.literal(root, COMMENT)),
            types: self.named_objects(root, TYPE),
            target_nanopub_types: self.named_objects(root, NT_HAS_TARGET_NANOPUB_TYPE),
            label_pattern: self.literal(root, NT_HAS_LABEL_PATTERN),
            tags: self
                .nanopub
                .document()
                .objects(self.graph(), root, NT_HAS_TAG)
                .into_iter()
                .map(|t| match t {
                    TermRef::Literal(l) => l.value().to_string(),
                    other => term_key(other),
                })
                .collect(),
            statement_refs,
        }
    }

    /// Resources of the assertion graph typed with a template-ontology class
    /// whose name ends in `Placeholder`, in order of first appearance.
    fn discover_placeholders(&self) -> Vec<(String, Vec<String>)> {
        let mut found: Vec<(String, Vec<String>)> = Vec::new();
        for quad in self.nanopub.document().match_predicate(self.graph(), TYPE) {
            let (NamedOrBlankNodeRef::NamedNode(s), TermRef::NamedNode(o)) =
                (quad.subject, quad.object)
            else {
                continue;
            };
            if !is_placeholder_class(o.as_str()) {
                continue;
            }
            let uri = s.as_str().to_string();
            if found.iter().any(|(u, _)| *u == uri) {
                continue;
            }
            let types = self.named_objects(s.into(), TYPE);
            found.push((uri, types));
        }
        found
    }

    fn field_id(&self, uri: &str) -> String {
        local_id(uri, &self.sub_namespace, self.nanopub.uri()).unwrap_or_else(|| uri.to_string())
    }

    fn fields(&self) -> Vec<TemplateField> {
        self.placeholders
            .iter()
            .map(|(uri, types)| self.field(uri, types))
            .collect()
    }

    fn field(&self, uri: &str, types: &[String]) -> TemplateField {
        let node = NamedNodeRef::new_unchecked(uri);
        let subject: NamedOrBlankNodeRef<'_> = node.into();
        let id = self.field_id(uri);

        let field_type = PlaceholderType::classify(types);
        if let PlaceholderType::Unknown(name) = &field_type {
            warn!(
                "Unrecognized placeholder type {} for {}; treating it as literal text",
                name, id
            );
        }

        let regex = self.literal(subject, NT_HAS_REGEX).and_then(|pattern| {
            match Regex::new(&format!("^(?:{})$", pattern)) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!("Ignoring invalid regex '{}' on {}: {}", pattern, id, e);
                    None
                }
            }
        });

        let options = self
            .named_objects(subject, NT_POSSIBLE_VALUE)
            .into_iter()
            .map(|value| {
                let node = NamedNodeRef::new_unchecked(&value);
                let name = self
                    .literal(node.into(), LABEL)
                    .unwrap_or_else(|| self.nanopub.display_label(&value));
                FieldOption {
                    name,
                    description: self.literal(node.into(), COMMENT),
                    uri: Some(value),
                }
            })
            .collect();

        TemplateField {
            label: self
                .literal(subject, LABEL)
                .unwrap_or_else(|| self.nanopub.display_label(uri)),
            description: self
                .literal(subject, DESCRIPTION)
                .or_else(|| self.literal(subject, COMMENT)),
            field_type,
            required: true,
            multiple: false,
            options,
            possible_values_from: self.named_objects(subject, NT_POSSIBLE_VALUES_FROM),
            options_unavailable: false,
            regex,
            prefix: self.literal(subject, NT_HAS_PREFIX),
            prefix_label: self.literal(subject, NT_HAS_PREFIX_LABEL),
            id,
            uri: uri.to_string(),
        }
    }

    fn statements(&self, refs: &[String]) -> Vec<Statement> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        for r in refs {
            self.walk_statement(r, false, false, None, &mut visited, &mut out);
        }
        out
    }

    fn walk_statement(
        &self,
        key: &str,
        inherited_optional: bool,
        inherited_repeatable: bool,
        group: Option<&str>,
        visited: &mut HashSet<String>,
        out: &mut Vec<Statement>,
    ) {
        if !visited.insert(key.to_string()) {
            return;
        }
        let Some(node) = self.node_for_key(key) else {
            warn!("Statement reference {} is not a resource; skipping", key);
            return;
        };
        let types = self.named_objects(node, TYPE);
        let has_type = |name: &str| {
            types
                .iter()
                .any(|t| template_local_name(t) == Some(name))
        };
        let optional = inherited_optional || has_type("OptionalStatement");
        let repeatable = inherited_repeatable || has_type("RepeatableStatement");
        let id = self.field_id(key);

        if has_type("GroupedStatement") {
            let members: Vec<String> = self
                .nanopub
                .document()
                .objects(self.graph(), node, NT_HAS_STATEMENT)
                .into_iter()
                .map(term_key)
                .collect();
            debug!("Grouped statement {} with {} members", id, members.len());
            for member in members {
                self.walk_statement(&member, optional, repeatable, Some(&id), visited, out);
            }
            return;
        }

        let doc = self.nanopub.document();
        let part = |predicate: NamedNodeRef<'_>| doc.match_one(self.graph(), node, predicate);
        let (Some(s), Some(p), Some(o)) = (part(RDF_SUBJECT), part(RDF_PREDICATE), part(RDF_OBJECT))
        else {
            warn!("Statement {} lacks rdf:subject, rdf:predicate or rdf:object; skipping", id);
            return;
        };
        out.push(Statement {
            id,
            subject: self.statement_term(s),
            predicate: self.statement_term(p),
            object: self.statement_term(o),
            types,
            optional,
            repeatable,
            group: group.map(|g| g.to_string()),
        });
    }

    fn node_for_key(&self, key: &str) -> Option<NamedOrBlankNodeRef<'a>> {
        // keys are produced by `term_key`; resolve them back against the dataset
        self.nanopub
            .document()
            .graph_quads(self.assertion)
            .into_iter()
            .map(|q| q.subject)
            .find(|s| node_key(*s) == key)
    }

    fn statement_term(&self, term: TermRef<'_>) -> StatementTerm {
        match term {
            TermRef::NamedNode(n) => {
                let uri = n.as_str().to_string();
                if self.placeholders.iter().any(|(u, _)| *u == uri) {
                    StatementTerm::Field {
                        field: self.field_id(&uri),
                        uri,
                    }
                } else {
                    StatementTerm::Uri { uri }
                }
            }
            TermRef::Literal(l) => StatementTerm::Literal {
                value: l.value().to_string(),
                datatype: l.datatype().as_str().to_string(),
                language: l.language().map(|s| s.to_string()),
            },
            other => StatementTerm::Uri {
                uri: other.to_string(),
            },
        }
    }
}

/// Stable string key for a resource: the URI for named nodes, `_:id` otherwise.
fn term_key(term: TermRef<'_>) -> String {
    match term {
        TermRef::NamedNode(n) => n.as_str().to_string(),
        other => other.to_string(),
    }
}

fn node_key(node: NamedOrBlankNodeRef<'_>) -> String {
    match node {
        NamedOrBlankNodeRef::NamedNode(n) => n.as_str().to_string(),
        NamedOrBlankNodeRef::BlankNode(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(locals: &[&str]) -> Vec<String> {
        locals
            .iter()
            .map(|l| format!("https://w3id.org/np/o/ntemplate/{}", l))
            .collect()
    }

    #[test]
    fn test_classify_by_substring() {
        assert_eq!(
            PlaceholderType::classify(&types(&["LongLiteralPlaceholder"])),
            PlaceholderType::LongLiteral
        );
        assert_eq!(
            PlaceholderType::classify(&types(&["LiteralPlaceholder"])),
            PlaceholderType::Literal
        );
        assert_eq!(
            PlaceholderType::classify(&types(&["ExternalUriPlaceholder"])),
            PlaceholderType::ExternalUri
        );
        assert_eq!(
            PlaceholderType::classify(&types(&["UriPlaceholder"])),
            PlaceholderType::Uri
        );
        assert_eq!(
            PlaceholderType::classify(&[
                "https://w3id.org/np/o/ntemplate/latest/GuidedChoicePlaceholder".to_string()
            ]),
            PlaceholderType::GuidedChoice
        );
        assert_eq!(
            PlaceholderType::classify(&types(&["LocalResource", "IntroducedResource"])),
            PlaceholderType::IntroducedResource
        );
    }

    #[test]
    fn test_unknown_type_keeps_name() {
        assert_eq!(
            PlaceholderType::classify(&types(&["HologramPlaceholder"])),
            PlaceholderType::Unknown("HologramPlaceholder".to_string())
        );
    }

    #[test]
    fn test_local_id() {
        let sub = "https://w3id.org/np/RAtmpl/";
        let tmpl = "https://w3id.org/np/RAtmpl";
        assert_eq!(
            local_id("https://w3id.org/np/RAtmpl/article", sub, tmpl).as_deref(),
            Some("article")
        );
        assert_eq!(
            local_id("https://w3id.org/np/RAtmpl#cites", sub, tmpl).as_deref(),
            Some("cites")
        );
        assert_eq!(local_id("http://purl.org/spar/cito/cites", sub, tmpl), None);
    }

    fn field(id: &str) -> TemplateField {
        TemplateField {
            id: id.to_string(),
            uri: format!("https://w3id.org/np/RAtmpl/{}", id),
            label: id.to_string(),
            description: None,
            field_type: PlaceholderType::Uri,
            required: true,
            multiple: false,
            options: vec![],
            possible_values_from: vec![],
            options_unavailable: false,
            regex: None,
            prefix: None,
            prefix_label: None,
        }
    }

    fn statement(id: &str, subject: &str, object: &str, optional: bool) -> Statement {
        let term = |f: &str| StatementTerm::Field {
            field: f.to_string(),
            uri: format!("https://w3id.org/np/RAtmpl/{}", f),
        };
        Statement {
            id: id.to_string(),
            subject: term(subject),
            predicate: StatementTerm::Uri {
                uri: "http://example.org/p".to_string(),
            },
            object: term(object),
            types: vec![],
            optional,
            repeatable: false,
            group: None,
        }
    }

    #[test]
    fn test_required_rules() {
        let mut fields = vec![field("a"), field("b"), field("c"), field("d")];
        let statements = vec![
            statement("st1", "a", "b", true),
            statement("st2", "a", "c", true),
            statement("st3", "c", "a", false),
        ];
        compute_requirements(&mut fields, &statements);
        // only ever the object of an optional statement
        assert!(!fields[1].required);
        // object of an optional statement but also used in a mandatory one
        assert!(fields[2].required);
        assert!(fields[0].required);
        // never used at all
        assert!(fields[3].required);
    }
}
