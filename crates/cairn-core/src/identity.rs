//! Content identities
//!
//! A file's identity is the SHA-256 digest of its bytes plus its byte
//! length. Both depend on content only, never on name or timestamps.

use crate::errors::{CairnError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

/// Read granularity used when hashing a file
pub const HASH_BLOCK_SIZE: usize = 4096;

/// Length of a hex encoded SHA-256 digest
pub const HASH_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 digest
///
/// Always exactly 64 characters from `[0-9a-f]`. The first two characters
/// name the store shard directory, the remainder names the entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Parse and normalize a hex digest
    ///
    /// Uppercase hex is accepted and lowered.
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::InvalidHash`] for a wrong length or a non-hex
    /// character.
    pub fn parse(value: &str) -> Result<Self> {
        if value.len() != HASH_HEX_LEN {
            return Err(CairnError::InvalidHash {
                value: value.to_string(),
                reason: format!("expected {} hex characters, got {}", HASH_HEX_LEN, value.len()),
            });
        }
        if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CairnError::InvalidHash {
                value: value.to_string(),
                reason: "contains a non-hex character".to_string(),
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Wrap a finished digest
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shard directory name: the first two hex characters
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }

    /// Entry name inside the shard: everything after the first two characters
    pub fn key(&self) -> &str {
        &self.0[2..]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = CairnError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = CairnError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hash and byte length of one file's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIdentity {
    pub hash: ContentHash,
    pub size: u64,
}

/// Compute the identity of the file at `path`
///
/// The file is streamed in [`HASH_BLOCK_SIZE`] reads, so memory use does not
/// depend on file size.
///
/// # Errors
///
/// Returns [`CairnError::Read`] naming `path` if the file cannot be opened or
/// a read fails part way. No partial identity is produced.
pub fn compute_identity(path: &Path) -> Result<ContentIdentity> {
    let file = File::open(path).map_err(|e| CairnError::read(path, &e))?;
    identity_of_reader(file).map_err(|e| CairnError::read(path, &e))
}

/// Compute the identity of everything readable from `reader`
///
/// # Errors
///
/// Propagates the first non-interrupt I/O error.
pub fn identity_of_reader<R: Read>(mut reader: R) -> std::io::Result<ContentIdentity> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_BLOCK_SIZE];
    let mut size = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        size += n as u64;
    }

    Ok(ContentIdentity {
        hash: ContentHash::from_digest(&hasher.finalize()),
        size,
    })
}

/// Hash an in-memory buffer
pub fn hash_bytes(content: &[u8]) -> ContentHash {
    ContentHash::from_digest(&Sha256::digest(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_empty_file_identity() {
        let file = NamedTempFile::new().unwrap();
        let id = compute_identity(file.path()).unwrap();

        assert_eq!(id.hash.as_str(), EMPTY_SHA256);
        assert_eq!(id.size, 0);
    }

    #[test]
    fn test_identity_is_deterministic() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        let first = compute_identity(file.path()).unwrap();
        let second = compute_identity(file.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.size, 11);
        assert_eq!(first.hash, hash_bytes(b"hello world"));
    }

    #[test]
    fn test_streaming_matches_one_shot_across_blocks() {
        let content: Vec<u8> = (0..(HASH_BLOCK_SIZE * 3 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        let id = identity_of_reader(&content[..]).unwrap();

        assert_eq!(id.hash, hash_bytes(&content));
        assert_eq!(id.size, content.len() as u64);
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");

        let err = compute_identity(&path).unwrap_err();
        match err {
            CairnError::Read { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_normalizes_and_splits() {
        let upper = EMPTY_SHA256.to_ascii_uppercase();
        let hash = ContentHash::parse(&upper).unwrap();

        assert_eq!(hash.as_str(), EMPTY_SHA256);
        assert_eq!(hash.shard(), "e3");
        assert_eq!(hash.key(), &EMPTY_SHA256[2..]);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(ContentHash::parse("abc").is_err());
        assert!(ContentHash::parse(&"g".repeat(64)).is_err());
        assert!("".parse::<ContentHash>().is_err());
    }

    #[test]
    fn test_serde_is_plain_string() {
        let hash = hash_bytes(b"");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", EMPTY_SHA256));

        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
        assert!(serde_json::from_str::<ContentHash>("\"xyz\"").is_err());
    }
}
