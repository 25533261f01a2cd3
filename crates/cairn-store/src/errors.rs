//! Error handling for cairn-store
//!
//! Wraps cairn-core ExError with store-specific helpers

use cairn_core::errors::{ExError, ExErrorKind};
use cairn_core::ContentHash;
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error naming the file involved
pub fn io_error(operation: &str, path: &Path, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation)
        .with_path(path)
        .with_message(err.to_string())
}

/// Create a missing-content error
pub fn store_missing(operation: &str, hash: &ContentHash) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(operation)
        .with_hash(hash.as_str())
        .with_message(format!("no stored content for hash {}", hash))
}

/// Create an insert-over-existing error
pub fn store_exists(hash: &ContentHash, entry: &Path) -> ExError {
    ExError::new(ExErrorKind::AlreadyExists)
        .with_op("store_insert")
        .with_hash(hash.as_str())
        .with_path(entry)
        .with_message(format!("content for hash {} is already stored", hash))
}

/// Create a retry exhaustion error carrying the last failure
pub fn retry_exhausted(dir: &Path, attempts: u32, last: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::RetryExhausted)
        .with_op("ensure_dir")
        .with_path(dir)
        .with_message(format!(
            "could not create directory after {} attempts",
            attempts
        ))
        .with_source(io_error("create_dir", dir, last))
}

/// Create an error for a store file name that is not a content hash
pub fn foreign_entry(path: &Path) -> ExError {
    ExError::new(ExErrorKind::InvalidHash)
        .with_op("store_list")
        .with_path(path)
        .with_message("store entry name is not a content hash")
}
