use chrono::prelude::*;
use nanotemplate::errors::NanopubError;
use nanotemplate::labels::{LabelCache, LabelLookup};
use nanotemplate::nanopub::Nanopub;
use std::fs;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("fixtures/{}", name)).unwrap()
}

#[test]
fn test_load_is_idempotent() {
    let text = fixture("sample_nanopub.trig");
    let labels = LabelCache::new();
    let first = Nanopub::load_str(&text, &labels).unwrap();
    let second = Nanopub::load_str(&text, &labels).unwrap();
    assert_eq!(first.graphs(), second.graphs());
    assert_eq!(first.metadata(), second.metadata());
}

#[test]
fn test_graph_uris() {
    let np = Nanopub::load_str(&fixture("sample_nanopub.trig"), &LabelCache::new()).unwrap();
    let graphs = np.graphs();
    assert_eq!(graphs.uri, "https://w3id.org/np/RAsampleNanopub");
    assert_eq!(graphs.head, "https://w3id.org/np/RAsampleNanopub/Head");
    assert_eq!(graphs.assertion, "https://w3id.org/np/RAsampleNanopub/assertion");
    assert_eq!(graphs.provenance, "https://w3id.org/np/RAsampleNanopub/provenance");
    assert_eq!(graphs.pubinfo, "https://w3id.org/np/RAsampleNanopub/pubinfo");
}

#[test]
fn test_metadata() {
    let np = Nanopub::load_str(&fixture("sample_nanopub.trig"), &LabelCache::new()).unwrap();
    let metadata = np.metadata();
    assert_eq!(
        metadata.created,
        Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(metadata.creators.len(), 1);
    assert_eq!(
        metadata.creators[0].uri,
        "https://orcid.org/0000-0002-1784-2920"
    );
    assert_eq!(metadata.creators[0].name.as_deref(), Some("Anne Fouilloux"));
    assert_eq!(metadata.title.as_deref(), Some("Citations for: 100573"));
    assert_eq!(
        metadata.license.as_deref(),
        Some("https://creativecommons.org/licenses/by/4.0/")
    );
    assert_eq!(metadata.types, vec!["http://purl.org/spar/cito/Citation"]);
}

#[test]
fn test_missing_linkage_is_structural_error() {
    let err = Nanopub::load_str(&fixture("missing_provenance.trig"), &LabelCache::new())
        .unwrap_err();
    let err = err.downcast_ref::<NanopubError>().unwrap();
    assert!(err.is_structural());
    assert!(err.to_string().contains("np:hasProvenance"));
}

#[test]
fn test_duplicate_linkage_is_structural_error() {
    let text = fixture("sample_nanopub.trig").replace(
        "np:hasAssertion sub:assertion ;",
        "np:hasAssertion sub:assertion, sub:assertion2 ;",
    );
    let err = Nanopub::load_str(&text, &LabelCache::new()).unwrap_err();
    assert!(err
        .downcast_ref::<NanopubError>()
        .map(|e| e.is_structural())
        .unwrap_or(false));
}

#[test]
fn test_parse_error() {
    let err = Nanopub::load_str("sub:Head { this: a", &LabelCache::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NanopubError>(),
        Some(NanopubError::Parse { .. })
    ));
}

#[test]
fn test_labels() {
    let labels = LabelCache::new();
    let np = Nanopub::load_str(&fixture("sample_nanopub.trig"), &labels).unwrap();
    assert_eq!(
        np.find_internal_label("https://orcid.org/0000-0002-1784-2920"),
        LabelLookup::Found("Anne Fouilloux".to_string())
    );
    assert_eq!(
        np.find_internal_label("https://doi.org/10.5194/gmd-17-2024"),
        LabelLookup::External
    );
    assert_eq!(
        np.display_label("https://doi.org/10.5194/gmd-17-2024"),
        "gmd-17-2024"
    );
    assert_eq!(
        np.find_internal_label("http://purl.org/dc/terms/license"),
        LabelLookup::Found("license".to_string())
    );
    // loading harvests names into the shared cache
    assert_eq!(
        labels.get("https://orcid.org/0000-0002-1784-2920").as_deref(),
        Some("Anne Fouilloux")
    );
}
