//! Validate: check a store holds every hash a manifest needs.

use super::elapsed_ms;
use cairn_core::{log_op_end, log_op_start, Manifest, ManifestEntry};
use cairn_store::ContentStore;
use serde::Serialize;
use std::time::Instant;

/// Missing entries listed individually before the summary line.
pub const MAX_LISTED_MISSING: usize = 15;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub checked: u64,
    pub missing: Vec<ManifestEntry>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn render(&self) -> String {
        if self.missing.is_empty() {
            return "Validation Successful.\n".to_string();
        }
        let mut out = String::new();
        for entry in self.missing.iter().take(MAX_LISTED_MISSING) {
            out.push_str(&format!("File '{}' is missing.\n", entry.path));
        }
        out.push_str(&format!("Total {} files missing.\n", self.missing.len()));
        out
    }
}

/// List the entries of `manifest` whose content `store` lacks.
pub fn validate(manifest: &Manifest, store: &dyn ContentStore) -> ValidationReport {
    let start = Instant::now();
    log_op_start!(
        "validate",
        store_root = %store.root().display(),
        entries = manifest.len() as u64
    );

    let missing: Vec<ManifestEntry> = manifest
        .entries()
        .filter(|entry| !store.exists(&entry.hash))
        .cloned()
        .collect();
    let report = ValidationReport {
        checked: manifest.len() as u64,
        missing,
    };

    log_op_end!(
        "validate",
        duration_ms = elapsed_ms(start),
        missing = report.missing.len() as u64
    );
    report
}
