//! Cairn Store - hash-sharded content stores
//!
//! Provides:
//! - The `ContentStore` contract shared by every backend
//! - A raw backend keeping verbatim bytes
//! - A compressed backend keeping zstd frames
//! - Temp-then-rename writes and bounded-retry directory creation

pub mod cas;
pub mod errors;

// Re-export key types
pub use cas::{open_store, CompressedStore, ContentStore, RawStore, StoreKind, StoreOptions};
pub use errors::Result;
