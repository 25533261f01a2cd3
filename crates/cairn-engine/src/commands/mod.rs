//! Command orchestration layer.
//!
//! Each driver receives its manifest, store and progress observer
//! explicitly and returns a serializable report.

pub mod extract;
pub mod flatten;
pub mod tidy;
pub mod validate;

use cairn_core::ContentHash;
use serde::Serialize;

/// A manifest entry a driver could not handle as asked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryIssue {
    pub hash: ContentHash,
    pub path: String,
}

impl EntryIssue {
    pub fn new(hash: &ContentHash, path: &str) -> Self {
        Self {
            hash: hash.clone(),
            path: path.to_string(),
        }
    }
}

pub(crate) fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
