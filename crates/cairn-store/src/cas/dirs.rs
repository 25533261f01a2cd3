//! Directory creation with bounded retry

use crate::errors::{io_error, retry_exhausted, Result};
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

const RETRY_DELAY: Duration = Duration::from_millis(20);

/// Create `dir` and its parents, retrying transient failures
///
/// Makes at most `attempts` tries (at least one) with a short pause between
/// them. An existing directory succeeds immediately.
///
/// # Errors
///
/// `ERR_RETRY_EXHAUSTED` naming `dir`, with the last I/O failure attached.
pub fn ensure_dir(dir: &Path, attempts: u32) -> Result<()> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        if dir.is_dir() {
            return Ok(());
        }
        match fs::create_dir_all(dir) {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= attempts => return Err(retry_exhausted(dir, attempts, e)),
            Err(e) => {
                debug!(path = %dir.display(), attempt, error = %e, "directory creation failed, retrying");
                attempt += 1;
                thread::sleep(RETRY_DELAY);
            }
        }
    }
}

/// Make `root` ready to receive entries
///
/// With `reset`, an existing root is deleted first (destructive and not
/// atomic). Without it, existing content is kept.
///
/// # Errors
///
/// `ERR_IO` if the old root cannot be removed, or any error from
/// [`ensure_dir`].
pub fn prepare_root(root: &Path, reset: bool, attempts: u32) -> Result<()> {
    if reset && root.exists() {
        info!(path = %root.display(), "resetting store root");
        fs::remove_dir_all(root).map_err(|e| io_error("store_reset", root, e))?;
    }
    ensure_dir(root, attempts)
}
