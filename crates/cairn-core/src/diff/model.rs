use crate::manifest::ManifestEntry;
use serde::Serialize;

/// A path present in both manifests whose content differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedEntry {
    pub previous: ManifestEntry,
    pub current: ManifestEntry,
}

impl ChangedEntry {
    pub fn path(&self) -> &str {
        &self.current.path
    }

    /// `oldHash->newHash,size,path`, size and path taken from the current entry
    pub fn to_line(&self) -> String {
        format!(
            "{}->{},{},{}",
            self.previous.hash, self.current.hash, self.current.size, self.current.path
        )
    }
}

/// Partition of the union of two manifests' paths
///
/// Every path lands in exactly one list. Each list is sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    /// Only in the current manifest
    pub added: Vec<ManifestEntry>,
    /// Only in the previous manifest
    pub removed: Vec<ManifestEntry>,
    /// In both, with a different hash or size
    pub changed: Vec<ChangedEntry>,
    /// In both and identical; entries from the current manifest
    pub unchanged: Vec<ManifestEntry>,
}

impl ManifestDiff {
    /// True when nothing was added, removed or changed
    pub fn is_identical(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Number of distinct paths across all four lists
    pub fn total_paths(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len() + self.unchanged.len()
    }
}
