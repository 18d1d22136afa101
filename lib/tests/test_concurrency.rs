use nanotemplate::config::Config;
use nanotemplate::labels::LabelCache;
use nanotemplate::Session;
use std::fs;
use std::sync::Arc;
use std::thread;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_parallel_loads_share_label_cache() {
    init_logger();
    let template_text = Arc::new(fs::read_to_string("fixtures/citation_template.trig").unwrap());
    let nanopub_text = Arc::new(fs::read_to_string("fixtures/sample_nanopub.trig").unwrap());
    let labels = LabelCache::new();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let labels = labels.clone();
            let template_text = Arc::clone(&template_text);
            let nanopub_text = Arc::clone(&nanopub_text);
            thread::spawn(move || {
                let session = Session::new(Config::offline()).with_labels(labels);
                if i % 2 == 0 {
                    let template = session.load_template_str(&template_text).unwrap();
                    (template.uri().to_string(), template.fields().len())
                } else {
                    let nanopub = session.load_nanopub_str(&nanopub_text).unwrap();
                    (nanopub.uri().to_string(), nanopub.metadata().creators.len())
                }
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let (uri, count) = handle.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(uri, "https://w3id.org/np/RAcitationTemplate");
            assert_eq!(count, 4);
        } else {
            assert_eq!(uri, "https://w3id.org/np/RAsampleNanopub");
            assert_eq!(count, 1);
        }
    }

    assert_eq!(
        labels.get("https://orcid.org/0000-0002-1784-2920").as_deref(),
        Some("Anne Fouilloux")
    );
    assert_eq!(
        labels.get("http://purl.org/spar/cito/extends").as_deref(),
        Some("extends")
    );
}

#[test]
fn test_sessions_are_isolated_by_default() {
    let text = fs::read_to_string("fixtures/sample_nanopub.trig").unwrap();
    let a = Session::new(Config::offline());
    let b = Session::new(Config::offline());
    a.load_nanopub_str(&text).unwrap();
    assert!(!a.labels().is_empty());
    assert!(b.labels().is_empty());
}

#[test]
fn test_offline_url_load_fails() {
    init_logger();
    let session = Session::new(Config::offline());
    let err = session
        .load_template("https://w3id.org/np/RAcitationTemplate")
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<nanotemplate::NanopubError>(),
        Some(nanotemplate::NanopubError::Offline { .. })
    ));
}
