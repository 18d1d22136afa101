//! Defines the configuration for loading templates and generating nanopublications.
//! The `Config` struct is built with `Config::builder()` or read from a JSON file.

use crate::consts::{DEFAULT_BASE_URI, DEFAULT_LICENSE, DEFAULT_PLATFORM_URI};
use crate::fetch::FetchOptions;
use anyhow::Result;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::path::Path;
use std::time::Duration;

fn default_base_uri() -> String {
    DEFAULT_BASE_URI.to_string()
}

fn default_license() -> String {
    DEFAULT_LICENSE.to_string()
}

fn default_platform_uri() -> String {
    DEFAULT_PLATFORM_URI.to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    10
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into), default)]
pub struct Config {
    /// Prefix of the placeholder URI given to freshly generated nanopublications
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    /// License stamped on generated nanopublications when none is supplied
    #[serde(default = "default_license")]
    pub default_license: String,
    /// Object of the `npx:wasCreatedAt` marker triple
    #[serde(default = "default_platform_uri")]
    pub platform_uri: String,
    // offline mode (never fetches documents or option lists)
    #[serde(default)]
    pub offline: bool,
    // fetch nt:possibleValuesFrom sources while loading a template
    #[serde(default = "default_true")]
    pub resolve_possible_values: bool,
    #[serde(default = "default_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_uri: default_base_uri(),
            default_license: default_license(),
            platform_uri: default_platform_uri(),
            offline: false,
            resolve_possible_values: true,
            fetch_timeout_secs: default_timeout(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Configuration that never touches the network.
    pub fn offline() -> Self {
        Config {
            offline: true,
            ..Config::default()
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            offline: self.offline,
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            ..FetchOptions::default()
        }
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Prints out the current Config in a clear and readable way for command line output.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  Base URI: {}", self.base_uri);
        println!("  Default License: {}", self.default_license);
        println!("  Platform URI: {}", self.platform_uri);
        println!("  Offline: {}", self.offline);
        println!("  Resolve Possible Values: {}", self.resolve_possible_values);
        println!("  Fetch Timeout: {}s", self.fetch_timeout_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder().offline(true).build().unwrap();
        assert!(config.offline);
        assert_eq!(config.base_uri, DEFAULT_BASE_URI);
        assert_eq!(config.default_license, DEFAULT_LICENSE);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert!(config.resolve_possible_values);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nanotemplate.json");
        let config = Config::builder()
            .base_uri("https://example.org/np/")
            .fetch_timeout_secs(3u64)
            .build()
            .unwrap();
        config.save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"offline": true}"#).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert!(loaded.offline);
        assert_eq!(loaded.platform_uri, DEFAULT_PLATFORM_URI);
        assert_eq!(loaded.fetch_options().timeout, Duration::from_secs(10));
    }
}
