//! Defines constant NamedNodeRefs for the vocabularies used by nanopublications
//! and nanopublication templates: the nanopub schema, the npx extension
//! vocabulary, the template ontology, DCTERMS, PROV, FOAF and RDFS.

use oxigraph::model::NamedNodeRef;

pub const TYPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
pub const RDF_SUBJECT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#subject");
pub const RDF_PREDICATE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#predicate");
pub const RDF_OBJECT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#object");

// rdfs
pub const LABEL: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#label");
pub const COMMENT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#comment");

// nanopub schema
pub const NANOPUBLICATION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.nanopub.org/nschema#Nanopublication");
pub const HAS_ASSERTION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.nanopub.org/nschema#hasAssertion");
pub const HAS_PROVENANCE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.nanopub.org/nschema#hasProvenance");
pub const HAS_PUBLICATION_INFO: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.nanopub.org/nschema#hasPublicationInfo");

// npx
pub const HAS_NANOPUB_TYPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/nanopub/x/hasNanopubType");
pub const EXAMPLE_NANOPUB: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/nanopub/x/ExampleNanopub");
pub const SIGNED_BY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/nanopub/x/signedBy");
pub const WAS_CREATED_AT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/nanopub/x/wasCreatedAt");
pub const INTRODUCES: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/nanopub/x/introduces");

// dcterms
pub const CREATED: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/dc/terms/created");
pub const CREATOR: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/dc/terms/creator");
pub const LICENSE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/dc/terms/license");
pub const TITLE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://purl.org/dc/terms/title");
pub const DESCRIPTION: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/dc/terms/description");
// pav
pub const CREATED_BY: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://purl.org/pav/createdBy");

// prov
pub const WAS_ATTRIBUTED_TO: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://www.w3.org/ns/prov#wasAttributedTo");

// foaf
pub const FOAF_NAME: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://xmlns.com/foaf/0.1/name");
pub const FOAF_MBOX: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("http://xmlns.com/foaf/0.1/mbox");

// nanopub template ontology
pub const NT_NAMESPACE: &str = "https://w3id.org/np/o/ntemplate/";
pub const NT_HAS_STATEMENT: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/hasStatement");
pub const NT_INCLUDES: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/includes");
pub const NT_HAS_TARGET_NANOPUB_TYPE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/hasTargetNanopubType");
pub const NT_HAS_LABEL_PATTERN: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/hasNanopubLabelPattern");
pub const NT_HAS_TAG: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/hasTag");
pub const NT_POSSIBLE_VALUES_FROM: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/possibleValuesFrom");
pub const NT_POSSIBLE_VALUE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/possibleValue");
pub const NT_HAS_REGEX: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/hasRegex");
pub const NT_HAS_PREFIX: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/hasPrefix");
pub const NT_HAS_PREFIX_LABEL: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/hasPrefixLabel");
pub const NT_WAS_CREATED_FROM_TEMPLATE: NamedNodeRef<'_> =
    NamedNodeRef::new_unchecked("https://w3id.org/np/o/ntemplate/wasCreatedFromTemplate");

pub const DEFAULT_LICENSE: &str = "https://creativecommons.org/licenses/by/4.0/";
pub const DEFAULT_BASE_URI: &str = "https://w3id.org/np/";
pub const DEFAULT_PLATFORM_URI: &str = "https://platform.sciencelive4all.org/";
pub const TRIG_MEDIA_TYPE: &str = "application/trig";

/// Prefixes bound in every generated nanopublication, except `this` and `sub`
/// which depend on the nanopublication URI.
pub const OUTPUT_PREFIXES: [(&str, &str); 8] = [
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("np", "http://www.nanopub.org/nschema#"),
    ("npx", "http://purl.org/nanopub/x/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("orcid", "https://orcid.org/"),
];
