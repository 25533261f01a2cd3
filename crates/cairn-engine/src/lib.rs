//! Cairn Engine - Orchestration layer
//!
//! Drives manifests through content stores: flatten a tree into a store,
//! extract a tree back out, check a store against a manifest, and tidy
//! unreferenced content.

pub mod commands;

pub use commands::extract::{extract, ExtractOptions, ExtractReport};
pub use commands::flatten::{flatten, FlattenOptions, FlattenReport};
pub use commands::tidy::{tidy, TidyReport};
pub use commands::validate::{validate, ValidationReport};
