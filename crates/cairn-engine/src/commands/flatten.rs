//! Flatten: deduplicate a source tree into a content store.
//!
//! ## Per entry (manifest order):
//! 1. Hash absent from the store: insert the source file
//! 2. Hash present and bytes equal: nothing to do (deduplicated)
//! 3. Hash present and bytes differ: collision, logged and recorded,
//!    stored bytes kept
//!
//! Any insert or compare failure aborts the run.

use super::{elapsed_ms, EntryIssue};
use cairn_core::errors::ExError;
use cairn_core::progress::{pretty_bytes, ProgressEvent, ProgressObserver};
use cairn_core::{log_op_end, log_op_error, log_op_start, Manifest};
use cairn_store::cas::prepare_root;
use cairn_store::errors::Result;
use cairn_store::{ContentStore, StoreKind};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

/// Options for a flatten run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Delete an existing store root before starting.
    pub reset: bool,
    /// Attempts made when creating the store root.
    pub dir_create_retries: u32,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            reset: false,
            dir_create_retries: 5,
        }
    }
}

/// Outcome of a flatten run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlattenReport {
    pub store_root: PathBuf,
    pub store_kind: StoreKind,
    /// Manifest entries processed.
    pub entries: u64,
    /// Entries whose content was newly stored.
    pub inserted: u64,
    /// Bytes read from the source for new entries.
    pub inserted_bytes: u64,
    /// Entries whose content was already stored with equal bytes.
    pub deduplicated: u64,
    /// Entries whose hash was stored with different bytes.
    pub collisions: Vec<EntryIssue>,
}

impl FlattenReport {
    pub fn render(&self) -> String {
        let mut out = format!(
            "Flattened {} items into {} ({} store)\n\
             Stored {} new items ({}), {} already present.\n",
            self.entries,
            self.store_root.display(),
            self.store_kind,
            self.inserted,
            pretty_bytes(self.inserted_bytes),
            self.deduplicated
        );
        if !self.collisions.is_empty() {
            out.push_str(&format!("Hash collisions: {}\n", self.collisions.len()));
            for c in &self.collisions {
                out.push_str(&format!("\t{} {}\n", c.hash, c.path));
            }
        }
        out
    }
}

/// Copy every entry of `manifest`, read from `source_root`, into `store`.
///
/// # Errors
///
/// Fails on the first source file that cannot be read or stored, naming
/// it, or if the store root cannot be prepared.
pub fn flatten(
    manifest: &Manifest,
    source_root: &Path,
    store: &dyn ContentStore,
    options: FlattenOptions,
    progress: &mut dyn ProgressObserver,
) -> Result<FlattenReport> {
    let start = Instant::now();
    log_op_start!(
        "flatten",
        store_root = %store.root().display(),
        store_kind = %store.kind(),
        entries = manifest.len() as u64,
        reset = options.reset
    );

    let result = run(manifest, source_root, store, options, progress);
    progress.finish();

    match &result {
        Ok(report) => log_op_end!(
            "flatten",
            duration_ms = elapsed_ms(start),
            inserted = report.inserted,
            deduplicated = report.deduplicated,
            collisions = report.collisions.len() as u64
        ),
        Err(e) => log_op_error!("flatten", e.clone(), duration_ms = elapsed_ms(start)),
    }
    result
}

fn run(
    manifest: &Manifest,
    source_root: &Path,
    store: &dyn ContentStore,
    options: FlattenOptions,
    progress: &mut dyn ProgressObserver,
) -> Result<FlattenReport> {
    prepare_root(store.root(), options.reset, options.dir_create_retries)?;

    let total = manifest.len() as u64;
    let mut report = FlattenReport {
        store_root: store.root().to_path_buf(),
        store_kind: store.kind(),
        entries: 0,
        inserted: 0,
        inserted_bytes: 0,
        deduplicated: 0,
        collisions: Vec::new(),
    };

    for entry in manifest.entries() {
        let source = entry
            .resolve_under(source_root)
            .map_err(|e| ExError::from(e).with_op("flatten"))?;

        if !store.exists(&entry.hash) {
            store.insert(&source, &entry.hash)?;
            report.inserted += 1;
            report.inserted_bytes += entry.size;
        } else if store.compare(&source, &entry.hash)? {
            report.deduplicated += 1;
        } else {
            warn!(
                hash = %entry.hash,
                path = %entry.path,
                "hash collision: stored content differs, keeping existing bytes"
            );
            report.collisions.push(EntryIssue::new(&entry.hash, &entry.path));
        }

        report.entries += 1;
        progress.on_event(ProgressEvent::Processed {
            processed: report.entries,
            total,
        });
    }

    Ok(report)
}
