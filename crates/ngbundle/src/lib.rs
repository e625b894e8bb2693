//! Release bundler for a multi-module JavaScript framework.
//!
//! Assembles named bundles from file-group manifests, stamps version
//! placeholders, and writes each bundle next to a minified sibling and its
//! source map.

pub mod assembler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod finalizer;
pub mod manifest;
pub mod minify;
pub mod orchestrator;
pub mod placeholder;
pub mod projection;
pub mod validate;
pub mod version;
