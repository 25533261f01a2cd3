//! Content-Addressable Storage (CAS)
//!
//! Provides:
//! - One [`ContentStore`] contract with raw and compressed backends
//! - Sharding by the first 2 hex chars of the hash
//! - Temp-then-rename writes so a crash never leaves a partial entry
//! - Block-wise comparison for collision detection

mod atomic;
mod blocks;
mod compressed;
mod dirs;
mod raw;
mod sharding;
mod traits;

pub use blocks::{compare_streams, StreamComparison, COMPARE_BLOCK_SIZE};
pub use compressed::{CompressedStore, INSERT_BLOCK_SIZE};
pub use dirs::{ensure_dir, prepare_root};
pub use raw::RawStore;
pub use sharding::{compressed_path, shard_dir, shard_path, COMPRESSED_SUFFIX};
pub use traits::{ContentStore, StoreKind};

use std::path::PathBuf;

/// Knobs shared by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// zstd level used by the compressed backend
    pub compression_level: i32,
    /// Attempts made when creating a directory
    pub dir_create_retries: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            compression_level: 3,
            dir_create_retries: 5,
        }
    }
}

/// Construct the backend for `kind` rooted at `root`
pub fn open_store(
    kind: StoreKind,
    root: impl Into<PathBuf>,
    options: StoreOptions,
) -> Box<dyn ContentStore> {
    match kind {
        StoreKind::Raw => Box::new(RawStore::new(root, options)),
        StoreKind::Compressed => Box::new(CompressedStore::new(root, options)),
    }
}
