//! Sharding logic for CAS
//!
//! Entries are spread over subdirectories named by the first 2 hex
//! characters of the hash, keeping any one directory small.

use crate::errors::{foreign_entry, io_error, Result};
use cairn_core::ContentHash;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name suffix of a compressed entry
pub const COMPRESSED_SUFFIX: &str = "zst";

/// `<root>/<hash[0:2]>`
pub fn shard_dir(root: &Path, hash: &ContentHash) -> PathBuf {
    root.join(hash.shard())
}

/// `<root>/<hash[0:2]>/<hash[2:]>`, the raw entry location
pub fn shard_path(root: &Path, hash: &ContentHash) -> PathBuf {
    shard_dir(root, hash).join(hash.key())
}

/// `<root>/<hash[0:2]>/<hash[2:]>.zst`, the compressed entry location
pub fn compressed_path(root: &Path, hash: &ContentHash) -> PathBuf {
    shard_dir(root, hash).join(format!("{}.{}", hash.key(), COMPRESSED_SUFFIX))
}

/// Which entry encodings to accept when listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Listing {
    RawOnly,
    Any,
}

/// Collect the hashes stored under `root`
///
/// Only files exactly two levels deep are considered. Leftover temp files
/// are ignored; any other foreign file name is an error, since it means the
/// directory is not a store.
pub(crate) fn list_hashes(root: &Path, listing: Listing) -> Result<Vec<ContentHash>> {
    let mut hashes = BTreeSet::new();
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    for item in WalkDir::new(root).min_depth(2).max_depth(2) {
        let item = item.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            io_error("store_list", &path, e.into())
        })?;
        if !item.file_type().is_file() {
            continue;
        }
        let (Some(name), Some(shard)) = (
            item.file_name().to_str(),
            item.path()
                .parent()
                .and_then(Path::file_name)
                .and_then(|s| s.to_str()),
        ) else {
            return Err(foreign_entry(item.path()));
        };
        if name.ends_with(".tmp") {
            continue;
        }

        let key = match name.strip_suffix(&format!(".{}", COMPRESSED_SUFFIX)) {
            Some(key) if listing == Listing::Any => key,
            Some(_) => continue,
            None => name,
        };
        let hash = ContentHash::parse(&format!("{}{}", shard, key))
            .map_err(|_| foreign_entry(item.path()))?;
        hashes.insert(hash);
    }

    Ok(hashes.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::identity::hash_bytes;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_shard_layout() {
        let hash = hash_bytes(b"");
        let root = Path::new("/store");

        assert_eq!(shard_dir(root, &hash), PathBuf::from("/store/e3"));
        assert_eq!(
            shard_path(root, &hash),
            PathBuf::from("/store/e3/b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert!(compressed_path(root, &hash)
            .to_str()
            .unwrap()
            .ends_with("7852b855.zst"));
    }

    #[test]
    fn test_list_skips_temp_and_filters_encoding() {
        let dir = TempDir::new().unwrap();
        let raw = hash_bytes(b"raw");
        let packed = hash_bytes(b"packed");

        fs::create_dir_all(shard_dir(dir.path(), &raw)).unwrap();
        fs::create_dir_all(shard_dir(dir.path(), &packed)).unwrap();
        fs::write(shard_path(dir.path(), &raw), b"raw").unwrap();
        fs::write(compressed_path(dir.path(), &packed), b"..").unwrap();
        fs::write(shard_dir(dir.path(), &raw).join("partial.tmp"), b"").unwrap();

        let all = list_hashes(dir.path(), Listing::Any).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&raw) && all.contains(&packed));

        assert_eq!(list_hashes(dir.path(), Listing::RawOnly).unwrap(), vec![raw]);
    }

    #[test]
    fn test_list_rejects_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("zz")).unwrap();
        fs::write(dir.path().join("zz").join("notes.txt"), b"hi").unwrap();

        let err = list_hashes(dir.path(), Listing::Any).unwrap_err();
        assert_eq!(err.code(), "ERR_INVALID_HASH");
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(list_hashes(&dir.path().join("none"), Listing::Any)
            .unwrap()
            .is_empty());
    }
}
