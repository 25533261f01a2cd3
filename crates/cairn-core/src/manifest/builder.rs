use super::{Manifest, ManifestEntry, PathFilter};
use crate::errors::{CairnError, Result};
use crate::identity::compute_identity;
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::{log_op_end, log_op_error, log_op_start};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use walkdir::WalkDir;

/// Counters gathered while walking a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Files hashed into the manifest
    pub files: u64,
    /// Sum of their sizes
    pub bytes: u64,
    /// Files or directories that could not be read
    pub skipped: u64,
    /// Files rejected by the path filter
    pub filtered: u64,
}

/// Walks a directory and produces a [`Manifest`]
///
/// Symlinks are never followed, and symlinked files are not recorded.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    root: PathBuf,
    filter: PathFilter,
}

impl ManifestBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filter: PathFilter::allow_all(),
        }
    }

    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hash every regular file under the root
    ///
    /// Unreadable files and directories are logged and skipped. A
    /// [`ProgressEvent::Loaded`] is emitted after each file.
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::NotADirectory`] if the root is not a directory.
    pub fn build(&self, progress: &mut dyn ProgressObserver) -> Result<(Manifest, BuildStats)> {
        let start = Instant::now();
        log_op_start!("manifest_build", root = %self.root.display());

        if !self.root.is_dir() {
            let err = CairnError::NotADirectory {
                path: self.root.clone(),
            };
            log_op_error!(
                "manifest_build",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            return Err(err);
        }

        let mut entries = BTreeMap::new();
        let mut stats = BuildStats::default();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();
        for item in walker {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!(
                        path = ?e.path(),
                        error = %e,
                        "skipping unreadable entry"
                    );
                    stats.skipped += 1;
                    continue;
                }
            };
            if !item.file_type().is_file() {
                continue;
            }

            let Some(rel) = relative_path(&self.root, item.path()) else {
                warn!(path = %item.path().display(), "skipping path that is not valid UTF-8");
                stats.skipped += 1;
                continue;
            };
            if !self.filter.allows(&rel) {
                stats.filtered += 1;
                continue;
            }

            match compute_identity(item.path()) {
                Ok(identity) => {
                    stats.files += 1;
                    stats.bytes += identity.size;
                    entries.insert(
                        rel.clone(),
                        ManifestEntry::new(rel, identity.size, identity.hash),
                    );
                    progress.on_event(ProgressEvent::Loaded {
                        files: stats.files,
                        bytes: stats.bytes,
                    });
                }
                Err(e) => {
                    warn!(path = %item.path().display(), error = %e, "skipping unreadable file");
                    stats.skipped += 1;
                }
            }
        }
        progress.finish();

        log_op_end!(
            "manifest_build",
            duration_ms = start.elapsed().as_millis() as u64,
            files = stats.files,
            bytes = stats.bytes,
            skipped = stats.skipped,
            filtered = stats.filtered
        );
        Ok((Manifest::from_map(entries), stats))
    }
}

/// `/`-joined path of `path` below `root`, with a leading `/`
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut out = String::new();
    for component in rel.components() {
        if let Component::Normal(name) = component {
            out.push('/');
            out.push_str(name.to_str()?);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
