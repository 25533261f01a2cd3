//! Cairn Core - content identities, manifests and manifest diffs
//!
//! This crate provides the storage-independent half of Cairn:
//! - SHA-256 content identities computed by streaming a file
//! - Manifests mapping `/`-prefixed relative paths to identities, with the
//!   `hash,size,path` text codec
//! - A directory walker that builds manifests, honouring allow/deny filters
//! - The four-way manifest diff and its plain-text report
//! - Progress bar formatting, configuration, errors and structured logging
//!
//! Stores and the flatten/extract drivers live in `cairn-store` and
//! `cairn-engine`.

pub mod config;
pub mod diff;
pub mod errors;
pub mod identity;
pub mod logging_facility;
pub mod manifest;
pub mod progress;

#[doc(hidden)]
pub use cairn_core_types as core_types;
#[doc(hidden)]
pub use tracing;

// Re-export commonly used types
pub use config::CairnConfig;
pub use diff::{render_report, ManifestDiff};
pub use errors::{CairnError, ExError, ExErrorKind, Result};
pub use identity::{compute_identity, ContentHash, ContentIdentity};
pub use manifest::{Manifest, ManifestBuilder, ManifestEntry, PathFilter};
pub use progress::{NoopProgress, ProgressEvent, ProgressObserver, TerminalProgress};
