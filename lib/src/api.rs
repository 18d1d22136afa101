//! Defines the `Session` entry point: loading nanopublications and templates
//! with a shared label cache and a pluggable source for option lists.

use crate::config::Config;
use crate::document::DocumentLocation;
use crate::labels::LabelCache;
use crate::nanopub::Nanopub;
use crate::template::Template;
use crate::values::{HttpValuesSource, PossibleValuesSource};
use anyhow::Result;
use log::{debug, info};

/// Initializes logging for the nanotemplate library.
///
/// If `NANOTEMPLATE_LOG` is set, `RUST_LOG` is set to its value, so it takes
/// precedence over `RUST_LOG`. The logger itself (e.g. `env_logger::init()`)
/// must be initialized after this call.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("NANOTEMPLATE_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}

pub struct Session {
    config: Config,
    labels: LabelCache,
    /// Option-list source; HTTP over the session's cache when unset.
    values_source: Option<Box<dyn PossibleValuesSource>>,
}

impl Session {
    /// A session fetching option lists over HTTP, honouring `config.offline`.
    pub fn new(config: Config) -> Self {
        Session {
            config,
            labels: LabelCache::new(),
            values_source: None,
        }
    }

    pub fn with_values_source(mut self, source: Box<dyn PossibleValuesSource>) -> Self {
        self.values_source = Some(source);
        self
    }

    /// Shares an existing cache with this session, e.g. between sessions that
    /// run in parallel.
    pub fn with_labels(mut self, labels: LabelCache) -> Self {
        self.labels = labels;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn labels(&self) -> &LabelCache {
        &self.labels
    }

    /// Loads a nanopublication from a URL (`http…`) or a file path.
    pub fn load_nanopub(&self, source: &str) -> Result<Nanopub> {
        let location = DocumentLocation::from_str(source);
        info!("Loading nanopublication from {}", location);
        Nanopub::load(location, &self.config, &self.labels)
    }

    pub fn load_nanopub_str(&self, text: &str) -> Result<Nanopub> {
        Nanopub::load_str(text, &self.labels)
    }

    pub fn load_template(&self, source: &str) -> Result<Template> {
        let nanopub = self.load_nanopub(source)?;
        self.template_from(nanopub)
    }

    pub fn load_template_str(&self, text: &str) -> Result<Template> {
        let nanopub = self.load_nanopub_str(text)?;
        self.template_from(nanopub)
    }

    fn template_from(&self, nanopub: Nanopub) -> Result<Template> {
        let mut template = Template::from_nanopub(nanopub)?;
        if self.config.resolve_possible_values && !self.config.offline {
            match &self.values_source {
                Some(source) => template.resolve_options(source.as_ref()),
                None => template.resolve_options(&HttpValuesSource::new(
                    self.config.fetch_options(),
                    self.labels.clone(),
                )),
            }
        } else {
            debug!("Not resolving possible values for {}", template.uri());
        }
        Ok(template)
    }
}

impl Template {
    /// Loads a template from a URL or file with a session of its own.
    pub fn load(source: &str, config: &Config) -> Result<Template> {
        Session::new(config.clone()).load_template(source)
    }

    pub fn load_str(text: &str, config: &Config) -> Result<Template> {
        Session::new(config.clone()).load_template_str(text)
    }
}
