use crate::errors::{CairnError, Result};
use crate::identity::ContentHash;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identity record for one file, keyed by its `/`-prefixed relative path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub size: u64,
    pub hash: ContentHash,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>, size: u64, hash: ContentHash) -> Self {
        Self {
            path: path.into(),
            size,
            hash,
        }
    }

    /// Manifest line for this entry: `hash,size,path`
    pub fn to_line(&self) -> String {
        format!("{},{},{}", self.hash, self.size, self.path)
    }

    /// Parse one manifest line
    ///
    /// The line is split on the first two commas only, so the path may
    /// itself contain commas. `line_no` is 1-based and is carried into any
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::MalformedManifestLine`] for a missing field, a
    /// non-integer size, an invalid hash or an empty path.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let mut fields = line.splitn(3, ',');
        let (Some(hash), Some(size), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(CairnError::malformed(
                line_no,
                "expected three comma separated fields: hash,size,path",
            ));
        };

        let hash = ContentHash::parse(hash)
            .map_err(|e| CairnError::malformed(line_no, e.to_string()))?;
        let size = size
            .parse::<u64>()
            .map_err(|_| CairnError::malformed(line_no, format!("size '{}' is not an integer", size)))?;
        if path.is_empty() {
            return Err(CairnError::malformed(line_no, "path is empty"));
        }

        Ok(Self::new(path, size, hash))
    }

    /// True when both entries describe the same path with the same content
    pub fn matches(&self, other: &ManifestEntry) -> bool {
        self.path == other.path && self.size == other.size && self.hash == other.hash
    }

    /// Place this entry's path under `root`
    ///
    /// Empty and `.` segments are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::UnsafeManifestPath`] if any segment is `..`,
    /// which would escape `root`, or if no segment remains.
    pub fn resolve_under(&self, root: &Path) -> Result<PathBuf> {
        let mut resolved = root.to_path_buf();
        let mut pushed = false;
        for segment in self.path.split(|c: char| c == '/' || (cfg!(windows) && c == '\\')) {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(CairnError::UnsafeManifestPath {
                        path: self.path.clone(),
                        reason: "contains a '..' segment".to_string(),
                    })
                }
                s if s.contains(':') && cfg!(windows) => {
                    return Err(CairnError::UnsafeManifestPath {
                        path: self.path.clone(),
                        reason: "contains a drive prefix".to_string(),
                    })
                }
                s => {
                    resolved.push(s);
                    pushed = true;
                }
            }
        }
        if !pushed {
            return Err(CairnError::UnsafeManifestPath {
                path: self.path.clone(),
                reason: "does not name a file".to_string(),
            });
        }
        Ok(resolved)
    }
}
