use crate::errors::Result;
use cairn_core::ContentHash;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Storage encoding of a content store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Verbatim bytes
    Raw,
    /// zstd frames
    Compressed,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::Raw => "raw",
            StoreKind::Compressed => "compressed",
        })
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" | "flattened" => Ok(StoreKind::Raw),
            "compressed" => Ok(StoreKind::Compressed),
            other => Err(format!("unknown store kind '{}'", other)),
        }
    }
}

/// Hash-sharded content-addressable storage
///
/// Entries live at `root/<hash[0:2]>/<hash[2:]>` (plus a backend specific
/// suffix). Stored bytes are never rewritten once present.
pub trait ContentStore {
    fn kind(&self) -> StoreKind;

    fn root(&self) -> &Path;

    /// Whether content for `hash` is present
    fn exists(&self, hash: &ContentHash) -> bool;

    /// Store the bytes of `source` under `hash`
    ///
    /// The caller vouches that `hash` is the content hash of `source`.
    ///
    /// # Errors
    ///
    /// `ERR_ALREADY_EXISTS` if `hash` is already stored (the entry is left
    /// untouched), `ERR_IO` naming `source` if it cannot be read, or
    /// `ERR_RETRY_EXHAUSTED` if the shard directory cannot be created.
    fn insert(&self, source: &Path, hash: &ContentHash) -> Result<()>;

    /// Write the content for `hash` to `dest`, creating parent directories
    ///
    /// # Errors
    ///
    /// `ERR_NOT_FOUND` if nothing is stored under `hash`, `ERR_IO` if the
    /// entry cannot be decoded or `dest` cannot be written.
    fn extract(&self, hash: &ContentHash, dest: &Path) -> Result<()>;

    /// Whether `source` holds exactly the bytes stored under `hash`
    ///
    /// # Errors
    ///
    /// `ERR_NOT_FOUND` if nothing is stored under `hash`, `ERR_IO` on read
    /// failure.
    fn compare(&self, source: &Path, hash: &ContentHash) -> Result<bool>;

    /// Every hash with stored content, sorted
    ///
    /// # Errors
    ///
    /// `ERR_IO` if the store root cannot be listed.
    fn stored_hashes(&self) -> Result<Vec<ContentHash>>;

    /// Delete the content for `hash`
    ///
    /// # Errors
    ///
    /// `ERR_NOT_FOUND` if nothing is stored, `ERR_IO` if removal fails.
    fn remove(&self, hash: &ContentHash) -> Result<()>;
}
