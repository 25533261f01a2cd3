//! Manifests: the set of files in a tree and their content identities
//!
//! The text form is one `hash,size,path` record per line, sorted by path.
//! Fields are not escaped; the path is everything after the second comma,
//! so a path may contain commas but never a newline.

pub mod builder;
pub mod entry;
pub mod filter;

pub use builder::{BuildStats, ManifestBuilder};
pub use entry::ManifestEntry;
pub use filter::{FilterAction, FilterRule, PathFilter};

use crate::diff::{diff_manifests, ManifestDiff};
use crate::errors::{CairnError, Result};
use crate::identity::ContentHash;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Suffix appended to a source name to form its manifest file name
pub const MANIFEST_SUFFIX: &str = "_manifest.txt";

/// Manifest file name for a source tree named `source_name`
pub fn manifest_file_name(source_name: &str) -> String {
    format!("{}{}", source_name, MANIFEST_SUFFIX)
}

/// Immutable path-ordered collection of [`ManifestEntry`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub(crate) fn from_map(entries: BTreeMap<String, ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Collect entries into a manifest
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::DuplicateManifestPath`] if two entries share a
    /// path; `line` is the 1-based position of the second one.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = ManifestEntry>,
    {
        let mut map = BTreeMap::new();
        for (idx, entry) in entries.into_iter().enumerate() {
            if map.contains_key(&entry.path) {
                return Err(CairnError::DuplicateManifestPath {
                    path: entry.path,
                    line: idx + 1,
                });
            }
            map.insert(entry.path.clone(), entry);
        }
        Ok(Self { entries: map })
    }

    /// Parse manifest text
    ///
    /// Blank lines are ignored and a trailing `\r` is stripped from each
    /// line. Any bad line fails the whole load.
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::MalformedManifestLine`] or
    /// [`CairnError::DuplicateManifestPath`] naming the 1-based line.
    pub fn load(text: &str) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (idx, raw) in text.split('\n').enumerate() {
            let line_no = idx + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() {
                continue;
            }
            let entry = ManifestEntry::parse_line(line, line_no)?;
            if map.contains_key(&entry.path) {
                return Err(CairnError::DuplicateManifestPath {
                    path: entry.path,
                    line: line_no,
                });
            }
            map.insert(entry.path.clone(), entry);
        }
        Ok(Self { entries: map })
    }

    /// Read and parse a manifest file
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::Read`] if the file cannot be read, or any
    /// error from [`Manifest::load`].
    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CairnError::read(path, &e))?;
        Self::load(&text)
    }

    /// Text form, one line per entry in path order
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for entry in self.entries.values() {
            out.push_str(&entry.to_line());
            out.push('\n');
        }
        out
    }

    /// Write the text form to `path`, replacing any existing file
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::Write`] naming `path`.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.serialize()).map_err(|e| CairnError::write(path, &e))
    }

    /// Compare this (current) manifest against a `previous` one
    pub fn diff(&self, previous: &Manifest) -> ManifestDiff {
        diff_manifests(self, previous)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.get(path)
    }

    /// Entries in path order
    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Sum of all entry sizes
    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|e| e.size).sum()
    }

    /// Distinct content hashes referenced by this manifest
    pub fn hashes(&self) -> BTreeSet<ContentHash> {
        self.entries.values().map(|e| e.hash.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::collections::btree_map::Values<'a, String, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::hash_bytes;

    fn entry(path: &str, content: &[u8]) -> ManifestEntry {
        ManifestEntry::new(path, content.len() as u64, hash_bytes(content))
    }

    #[test]
    fn test_serialize_sorts_by_path() {
        let manifest =
            Manifest::from_entries(vec![entry("/b.txt", b"b"), entry("/a.txt", b"a")]).unwrap();

        let text = manifest.serialize();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(",1,/a.txt"));
        assert!(lines[1].ends_with(",1,/b.txt"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_empty_manifest_serializes_to_nothing() {
        assert_eq!(Manifest::default().serialize(), "");
        assert!(Manifest::load("").unwrap().is_empty());
    }

    #[test]
    fn test_load_accepts_crlf_and_blank_lines() {
        let text = format!(
            "{}\r\n\r\n{}\r\n",
            entry("/a.txt", b"a").to_line(),
            entry("/b.txt", b"bb").to_line()
        );
        let manifest = Manifest::load(&text).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("/b.txt").unwrap().size, 2);
    }

    #[test]
    fn test_load_rejects_duplicate_path_with_line() {
        let line = entry("/a.txt", b"a").to_line();
        let text = format!("{line}\n{line}\n");
        let err = Manifest::load(&text).unwrap_err();
        assert_eq!(
            err,
            CairnError::DuplicateManifestPath {
                path: "/a.txt".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn test_bad_line_fails_whole_load() {
        let text = format!("{}\nnot,a-number,/x\n", entry("/a.txt", b"a").to_line());
        let err = Manifest::load(&text).unwrap_err();
        assert!(matches!(err, CairnError::MalformedManifestLine { line: 2, .. }));
    }

    #[test]
    fn test_hashes_are_distinct() {
        let manifest = Manifest::from_entries(vec![
            entry("/a.txt", b"same"),
            entry("/b.txt", b"same"),
            entry("/c.txt", b"other"),
        ])
        .unwrap();
        assert_eq!(manifest.hashes().len(), 2);
        assert_eq!(manifest.total_size(), 13);
    }

    #[test]
    fn test_manifest_file_name() {
        assert_eq!(manifest_file_name("Build_1"), "Build_1_manifest.txt");
    }
}
