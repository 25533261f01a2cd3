//! Store keeping zstd-compressed entries
//!
//! An entry is a single zstd frame at `<shard>/<key>.zst`. A bare `<key>`
//! file (a raw entry copied in from a raw store) is also honoured for
//! lookups and extraction.

use super::atomic::atomic_write_with;
use super::blocks::{compare_streams, read_block, COMPARE_BLOCK_SIZE};
use super::dirs::ensure_dir;
use super::raw::{compare_files, copy_out};
use super::sharding::{compressed_path, list_hashes, shard_dir, shard_path, Listing};
use super::traits::{ContentStore, StoreKind};
use super::StoreOptions;
use crate::errors::{io_error, store_exists, store_missing, Result};
use cairn_core::ContentHash;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zstd::stream::read::Decoder;

/// Read size used while encoding a source file
pub const INSERT_BLOCK_SIZE: usize = 32 * 1024;

#[derive(Debug, Clone)]
pub struct CompressedStore {
    root: PathBuf,
    options: StoreOptions,
}

impl CompressedStore {
    pub fn new(root: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    fn open_decoder(&self, entry: &Path, op: &str) -> Result<Decoder<'static, BufReader<File>>> {
        let file = File::open(entry).map_err(|e| io_error(op, entry, e))?;
        Decoder::new(file).map_err(|e| io_error(op, entry, e))
    }
}

fn encode_into<R: io::Read>(src: &mut R, out: &mut File, level: i32) -> io::Result<()> {
    let mut encoder = zstd::stream::write::Encoder::new(out, level)?;
    let mut buf = vec![0u8; INSERT_BLOCK_SIZE];
    loop {
        let n = read_block(src, &mut buf)?;
        if n == 0 {
            break;
        }
        encoder.write_all(&buf[..n])?;
    }
    encoder.finish()?;
    Ok(())
}

impl ContentStore for CompressedStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Compressed
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, hash: &ContentHash) -> bool {
        compressed_path(&self.root, hash).is_file() || shard_path(&self.root, hash).is_file()
    }

    fn insert(&self, source: &Path, hash: &ContentHash) -> Result<()> {
        let target = compressed_path(&self.root, hash);
        if self.exists(hash) {
            return Err(store_exists(hash, &target));
        }

        let mut src = File::open(source).map_err(|e| io_error("store_insert", source, e))?;
        ensure_dir(&shard_dir(&self.root, hash), self.options.dir_create_retries)?;
        let level = self.options.compression_level;
        atomic_write_with(&target, |out| encode_into(&mut src, out, level)).map_err(|e| {
            // Read failures surface from the encoder loop; name the source too.
            let message = format!("failed to compress {}: {}", source.display(), e.message());
            e.with_message(message)
        })?;

        debug!(hash = %hash, source = %source.display(), level, "stored compressed entry");
        Ok(())
    }

    fn extract(&self, hash: &ContentHash, dest: &Path) -> Result<()> {
        let entry = compressed_path(&self.root, hash);
        if entry.is_file() {
            let mut decoder = self.open_decoder(&entry, "store_extract")?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| io_error("store_extract", parent, e))?;
            }
            let mut out = File::create(dest).map_err(|e| io_error("store_extract", dest, e))?;
            io::copy(&mut decoder, &mut out).map_err(|e| io_error("store_extract", &entry, e))?;
            return out.flush().map_err(|e| io_error("store_extract", dest, e));
        }

        let raw = shard_path(&self.root, hash);
        if raw.is_file() {
            return copy_out(&raw, dest);
        }
        Err(store_missing("store_extract", hash))
    }

    fn compare(&self, source: &Path, hash: &ContentHash) -> Result<bool> {
        let entry = compressed_path(&self.root, hash);
        if !entry.is_file() {
            let raw = shard_path(&self.root, hash);
            if raw.is_file() {
                return compare_files(source, &raw, hash);
            }
            return Err(store_missing("store_compare", hash));
        }

        let decoder = self.open_decoder(&entry, "store_compare")?;
        let src = File::open(source).map_err(|e| io_error("store_compare", source, e))?;
        let outcome = compare_streams(decoder, BufReader::new(src), COMPARE_BLOCK_SIZE)
            .map_err(|e| io_error("store_compare", &entry, e))?;
        if !outcome.is_equal() {
            debug!(hash = %hash, ?outcome, "stored bytes differ");
        }
        Ok(outcome.is_equal())
    }

    fn stored_hashes(&self) -> Result<Vec<ContentHash>> {
        list_hashes(&self.root, Listing::Any)
    }

    fn remove(&self, hash: &ContentHash) -> Result<()> {
        let mut removed = false;
        for entry in [compressed_path(&self.root, hash), shard_path(&self.root, hash)] {
            if entry.is_file() {
                fs::remove_file(&entry).map_err(|e| io_error("store_remove", &entry, e))?;
                removed = true;
            }
        }
        if removed {
            Ok(())
        } else {
            Err(store_missing("store_remove", hash))
        }
    }
}
