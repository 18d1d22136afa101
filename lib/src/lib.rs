//! Loads nanopublication templates, extracts their fields and statement
//! patterns, derives form schemas from them, and instantiates them into new
//! nanopublications serialized as TriG.

extern crate derive_builder;

pub mod api;
pub mod config;
pub mod consts;
pub mod document;
pub mod errors;
pub mod fetch;
pub mod instantiate;
pub mod labels;
pub mod nanopub;
pub mod schema;
pub mod template;
pub mod terms;
pub mod trig;
pub mod values;

pub use crate::api::{init_logging, Session};
pub use crate::config::Config;
pub use crate::errors::NanopubError;
pub use crate::instantiate::{
    FieldValue, GeneratedNanopub, PubData, SignedNanopub, Signer, TemplateValues,
};
pub use crate::nanopub::{Nanopub, NanopubGraphs, NanopubMetadata};
pub use crate::template::{PlaceholderType, Template, TemplateField};
