//! Atomic write primitives
//!
//! Uses temp→rename so a store entry is either absent or complete

use crate::errors::{io_error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Atomically create `target` with content produced by `fill`
///
/// `fill` writes into a temp file beside `target`; the temp file is synced
/// and renamed into place only if `fill` succeeds, and removed otherwise.
/// The parent directory must already exist.
pub fn atomic_write_with<F>(target: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let temp_path = temp_path_for(target);

    let mut file = File::create(&temp_path).map_err(|e| io_error("store_write_temp", &temp_path, e))?;
    let written = fill(&mut file)
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_all());
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("store_write_temp", &temp_path, e));
    }

    fs::rename(&temp_path, target).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        io_error("store_rename_temp", target, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|s| s.ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count()
    }

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("entry");

        atomic_write_with(&target, |f| f.write_all(b"hello")).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"hello");
        assert_eq!(tmp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_failed_fill_leaves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("entry.zst");

        let result = atomic_write_with(&target, |f| {
            f.write_all(b"partial")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "source vanished"))
        });

        assert!(result.is_err());
        assert!(!target.exists());
        assert_eq!(tmp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_temp_name_keeps_full_file_name() {
        assert_eq!(
            temp_path_for(Path::new("/s/ab/cdef.zst")),
            PathBuf::from("/s/ab/cdef.zst.tmp")
        );
    }
}
