//! Extract: rematerialize a tree from a manifest and a store.
//!
//! Per-entry problems (unsafe path, content missing from the store,
//! extraction failure) are logged and counted; only an unusable target
//! root aborts the run.

use super::{elapsed_ms, EntryIssue};
use cairn_core::progress::{ProgressEvent, ProgressObserver};
use cairn_core::{log_op_end, log_op_error, log_op_start, Manifest};
use cairn_store::cas::ensure_dir;
use cairn_store::errors::Result;
use cairn_store::ContentStore;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::warn;

/// Options for an extract run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Attempts made when creating the target root and entry directories.
    pub dir_create_retries: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dir_create_retries: 5,
        }
    }
}

/// Outcome of an extract run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    pub extracted: u64,
    /// Entries whose hash the store does not hold.
    pub missing: Vec<EntryIssue>,
    /// Entries whose directory could not be created or whose content could
    /// not be written out.
    pub failed: u64,
    /// Entries whose path would escape the target root.
    pub rejected: Vec<EntryIssue>,
}

impl ExtractReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed == 0 && self.rejected.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = format!("Extracted {} items.\n", self.extracted);
        if !self.missing.is_empty() {
            out.push_str(&format!("Missing {} items.\n", self.missing.len()));
        }
        if self.failed > 0 {
            out.push_str(&format!("Failed to extract {} items.\n", self.failed));
        }
        if !self.rejected.is_empty() {
            out.push_str(&format!("Rejected {} unsafe paths.\n", self.rejected.len()));
        }
        out
    }
}

/// Write every entry of `manifest` under `target_root` using `store`.
///
/// An entry's parent directories are created before its content is looked
/// up, so a missing entry still leaves its directory behind.
///
/// # Errors
///
/// Only when `target_root` cannot be created.
pub fn extract(
    manifest: &Manifest,
    store: &dyn ContentStore,
    target_root: &Path,
    options: ExtractOptions,
    progress: &mut dyn ProgressObserver,
) -> Result<ExtractReport> {
    let start = Instant::now();
    log_op_start!(
        "extract",
        store_root = %store.root().display(),
        store_kind = %store.kind(),
        target = %target_root.display(),
        entries = manifest.len() as u64
    );

    if let Err(e) = ensure_dir(target_root, options.dir_create_retries) {
        log_op_error!("extract", e.clone(), duration_ms = elapsed_ms(start));
        return Err(e);
    }

    let total = manifest.len() as u64;
    let mut report = ExtractReport::default();

    for (index, entry) in manifest.entries().enumerate() {
        match entry.resolve_under(target_root) {
            Err(e) => {
                warn!(path = %entry.path, error = %e, "skipping entry with unsafe path");
                report.rejected.push(EntryIssue::new(&entry.hash, &entry.path));
            }
            Ok(dest) => {
                let parent = dest.parent().unwrap_or(target_root);
                if let Err(e) = ensure_dir(parent, options.dir_create_retries) {
                    warn!(path = %entry.path, error = %e, "cannot create entry directory");
                    report.failed += 1;
                } else if !store.exists(&entry.hash) {
                    warn!(
                        hash = %entry.hash,
                        path = %entry.path,
                        "content unavailable for hash {}, {} will be missing",
                        entry.hash,
                        entry.path
                    );
                    report.missing.push(EntryIssue::new(&entry.hash, &entry.path));
                } else {
                    match store.extract(&entry.hash, &dest) {
                        Ok(()) => report.extracted += 1,
                        Err(e) => {
                            warn!(hash = %entry.hash, path = %entry.path, error = %e, "extraction failed");
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        progress.on_event(ProgressEvent::Processed {
            processed: index as u64 + 1,
            total,
        });
    }
    progress.finish();

    log_op_end!(
        "extract",
        duration_ms = elapsed_ms(start),
        extracted = report.extracted,
        missing = report.missing.len() as u64,
        failed = report.failed,
        rejected = report.rejected.len() as u64
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::identity::hash_bytes;
    use cairn_core::progress::NoopProgress;
    use cairn_core::ManifestEntry;
    use cairn_store::{open_store, StoreKind, StoreOptions};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_content_is_reported_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let store = open_store(StoreKind::Raw, dir.path().join("store"), StoreOptions::default());

        let present = b"present";
        let src = dir.path().join("p");
        fs::write(&src, present).unwrap();
        let present_hash = hash_bytes(present);
        store.insert(&src, &present_hash).unwrap();

        let absent_hash = hash_bytes(b"absent");
        let manifest = Manifest::from_entries([
            ManifestEntry::new("/gone/a.txt", 6, absent_hash.clone()),
            ManifestEntry::new("/b/c.txt", 7, present_hash),
        ])
        .unwrap();

        let out = dir.path().join("out");
        let report = extract(
            &manifest,
            store.as_ref(),
            &out,
            ExtractOptions::default(),
            &mut NoopProgress,
        )
        .unwrap();

        assert_eq!(report.extracted, 1);
        assert_eq!(report.missing, vec![EntryIssue::new(&absent_hash, "/gone/a.txt")]);
        assert!(!report.is_complete());
        assert_eq!(fs::read(out.join("b").join("c.txt")).unwrap(), present);
        assert!(out.join("gone").is_dir());
        assert!(!out.join("gone").join("a.txt").exists());
    }

    #[test]
    fn test_parent_traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = open_store(StoreKind::Raw, dir.path().join("store"), StoreOptions::default());
        let manifest =
            Manifest::from_entries([ManifestEntry::new("/../escape", 1, hash_bytes(b"e"))]).unwrap();

        let report = extract(
            &manifest,
            store.as_ref(),
            &dir.path().join("out"),
            ExtractOptions::default(),
            &mut NoopProgress,
        )
        .unwrap();

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.extracted, 0);
        assert!(!dir.path().join("escape").exists());
        assert!(report.render().contains("Rejected 1 unsafe paths."));
    }
}
