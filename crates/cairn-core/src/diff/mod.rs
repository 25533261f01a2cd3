//! Manifest diff
//!
//! - `model`: the four-way partition produced by a diff
//! - `engine`: computes the partition from two manifests
//! - `report`: renders the partition as plain text

pub mod engine;
pub mod model;
pub mod report;

pub use engine::diff_manifests;
pub use model::{ChangedEntry, ManifestDiff};
pub use report::{render_report, report_file_name};
