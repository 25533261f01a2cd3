//! Store keeping verbatim bytes

use super::atomic::atomic_write_with;
use super::blocks::{compare_streams, COMPARE_BLOCK_SIZE};
use super::dirs::ensure_dir;
use super::sharding::{list_hashes, shard_dir, shard_path, Listing};
use super::traits::{ContentStore, StoreKind};
use super::StoreOptions;
use crate::errors::{io_error, store_exists, store_missing, Result};
use cairn_core::ContentHash;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Raw filesystem store: each entry is a plain copy of the source file
#[derive(Debug, Clone)]
pub struct RawStore {
    root: PathBuf,
    options: StoreOptions,
}

impl RawStore {
    pub fn new(root: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }
}

/// Byte-compare `source` against the stored file `entry`
pub(crate) fn compare_files(source: &Path, entry: &Path, hash: &ContentHash) -> Result<bool> {
    let src_len = fs::metadata(source)
        .map_err(|e| io_error("store_compare", source, e))?
        .len();
    let entry_len = fs::metadata(entry)
        .map_err(|e| io_error("store_compare", entry, e))?
        .len();
    if src_len != entry_len {
        debug!(hash = %hash, src_len, entry_len, "stored length differs");
        return Ok(false);
    }

    let src = File::open(source).map_err(|e| io_error("store_compare", source, e))?;
    let stored = File::open(entry).map_err(|e| io_error("store_compare", entry, e))?;
    let outcome = compare_streams(
        io::BufReader::new(src),
        io::BufReader::new(stored),
        COMPARE_BLOCK_SIZE,
    )
    .map_err(|e| io_error("store_compare", source, e))?;
    if !outcome.is_equal() {
        debug!(hash = %hash, ?outcome, "stored bytes differ");
    }
    Ok(outcome.is_equal())
}

/// Copy `entry` to `dest`, creating parent directories
pub(crate) fn copy_out(entry: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("store_extract", parent, e))?;
    }
    fs::copy(entry, dest).map_err(|e| io_error("store_extract", dest, e))?;
    Ok(())
}

impl ContentStore for RawStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Raw
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, hash: &ContentHash) -> bool {
        shard_path(&self.root, hash).is_file()
    }

    fn insert(&self, source: &Path, hash: &ContentHash) -> Result<()> {
        let target = shard_path(&self.root, hash);
        if target.is_file() {
            return Err(store_exists(hash, &target));
        }

        let mut src = File::open(source).map_err(|e| io_error("store_insert", source, e))?;
        ensure_dir(&shard_dir(&self.root, hash), self.options.dir_create_retries)?;
        atomic_write_with(&target, |out| io::copy(&mut src, out).map(|_| ()))?;

        debug!(hash = %hash, source = %source.display(), "stored raw entry");
        Ok(())
    }

    fn extract(&self, hash: &ContentHash, dest: &Path) -> Result<()> {
        let entry = shard_path(&self.root, hash);
        if !entry.is_file() {
            return Err(store_missing("store_extract", hash));
        }
        copy_out(&entry, dest)
    }

    fn compare(&self, source: &Path, hash: &ContentHash) -> Result<bool> {
        let entry = shard_path(&self.root, hash);
        if !entry.is_file() {
            return Err(store_missing("store_compare", hash));
        }
        compare_files(source, &entry, hash)
    }

    fn stored_hashes(&self) -> Result<Vec<ContentHash>> {
        list_hashes(&self.root, Listing::RawOnly)
    }

    fn remove(&self, hash: &ContentHash) -> Result<()> {
        let entry = shard_path(&self.root, hash);
        if !entry.is_file() {
            return Err(store_missing("store_remove", hash));
        }
        fs::remove_file(&entry).map_err(|e| io_error("store_remove", &entry, e))
    }
}
