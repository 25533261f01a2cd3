//! Tidy: remove store content no manifest references.

use super::elapsed_ms;
use cairn_core::errors::{ExError, ExErrorKind};
use cairn_core::{log_op_end, log_op_error, log_op_start, ContentHash, Manifest};
use cairn_store::errors::Result;
use cairn_store::ContentStore;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TidyReport {
    /// Manifests whose hashes were kept.
    pub manifests: u64,
    pub removed: u64,
    pub kept: u64,
    pub failed: u64,
}

impl TidyReport {
    pub fn render(&self) -> String {
        let mut out = format!("Manifests remaining : {}\n", self.manifests);
        if self.removed > 0 {
            out.push_str(&format!("Removed {} files.\n", self.removed));
        }
        if self.failed > 0 {
            out.push_str(&format!("Failed to remove {} files.\n", self.failed));
        }
        if self.kept > 0 {
            out.push_str(&format!("Kept {} files.\n", self.kept));
        }
        out
    }
}

/// Delete every entry of `store` whose hash none of `manifests` references.
///
/// A removal failure is logged and counted; the run continues.
///
/// # Errors
///
/// `ERR_INVALID_INPUT` for an empty manifest list (which would empty the
/// store), or any error listing the store.
pub fn tidy(manifests: &[Manifest], store: &dyn ContentStore) -> Result<TidyReport> {
    let start = Instant::now();
    log_op_start!(
        "tidy",
        store_root = %store.root().display(),
        manifests = manifests.len() as u64
    );

    let result = run(manifests, store);
    match &result {
        Ok(report) => log_op_end!(
            "tidy",
            duration_ms = elapsed_ms(start),
            removed = report.removed,
            kept = report.kept,
            failed = report.failed
        ),
        Err(e) => log_op_error!("tidy", e.clone(), duration_ms = elapsed_ms(start)),
    }
    result
}

fn run(manifests: &[Manifest], store: &dyn ContentStore) -> Result<TidyReport> {
    if manifests.is_empty() {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("tidy")
            .with_path(store.root())
            .with_message("at least one manifest is required"));
    }

    let referenced: BTreeSet<ContentHash> = manifests.iter().flat_map(Manifest::hashes).collect();
    let mut report = TidyReport {
        manifests: manifests.len() as u64,
        ..TidyReport::default()
    };

    for hash in store.stored_hashes()? {
        if referenced.contains(&hash) {
            report.kept += 1;
            continue;
        }
        match store.remove(&hash) {
            Ok(()) => {
                debug!(hash = %hash, "removed unreferenced entry");
                report.removed += 1;
            }
            Err(e) => {
                warn!(hash = %hash, error = %e, "failed to remove entry");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_omits_zero_counts() {
        let report = TidyReport {
            manifests: 2,
            removed: 3,
            kept: 0,
            failed: 0,
        };
        assert_eq!(report.render(), "Manifests remaining : 2\nRemoved 3 files.\n");
    }

    #[test]
    fn test_render_all_counts() {
        let report = TidyReport {
            manifests: 1,
            removed: 1,
            kept: 4,
            failed: 2,
        };
        assert_eq!(
            report.render(),
            "Manifests remaining : 1\nRemoved 1 files.\nFailed to remove 2 files.\nKept 4 files.\n"
        );
    }
}
