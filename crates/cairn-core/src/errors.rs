use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using CairnError
pub type Result<T> = std::result::Result<T, CairnError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and machine-readable CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    InvalidHash,
    InvalidPath,
    InvalidFilter,

    // Manifest parsing
    /// A manifest line is missing a field, has a bad size or a bad hash
    InvalidManifest,
    /// The same path appears twice in one manifest
    DuplicateEntry,

    // Content store
    NotFound,
    AlreadyExists,

    // Integration/IO
    Io,
    /// A bounded retry loop ran out of attempts
    RetryExhausted,
    Config,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidHash => "ERR_INVALID_HASH",
            ExErrorKind::InvalidPath => "ERR_INVALID_PATH",
            ExErrorKind::InvalidFilter => "ERR_INVALID_FILTER",
            ExErrorKind::InvalidManifest => "ERR_INVALID_MANIFEST",
            ExErrorKind::DuplicateEntry => "ERR_DUPLICATE_ENTRY",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::RetryExhausted => "ERR_RETRY_EXHAUSTED",
            ExErrorKind::Config => "ERR_CONFIG",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification for programmatic handling plus the file, hash
/// or manifest line the failure concerns.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    hash: Option<String>,
    line: Option<usize>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            hash: None,
            line: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add filesystem path or manifest path context
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().display().to_string());
        self
    }

    /// Add content hash context
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Add 1-based manifest line context
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the hash context, if any
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Get the manifest line context, if any
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(hash) = &self.hash {
            write!(f, " (hash: {})", hash)?;
        }
        if let Some(line) = self.line {
            write!(f, " (line: {})", line)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for manifest, identity, filter and configuration operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CairnError {
    // ===== Filesystem Errors =====
    /// A file or directory could not be opened or read
    #[error("Failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// A file could not be created or written
    #[error("Failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// Walk root is missing or not a directory
    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    // ===== Identity Errors =====
    /// Hash text is not a 64 character hex digest
    #[error("Invalid content hash '{value}': {reason}")]
    InvalidHash { value: String, reason: String },

    // ===== Manifest Errors =====
    /// A manifest line could not be parsed
    #[error("Malformed manifest line {line}: {reason}")]
    MalformedManifestLine { line: usize, reason: String },

    /// A manifest path occurs more than once
    #[error("Duplicate manifest path {path} at line {line}")]
    DuplicateManifestPath { path: String, line: usize },

    /// A manifest path cannot be placed under a root directory
    #[error("Unsafe manifest path {path}: {reason}")]
    UnsafeManifestPath { path: String, reason: String },

    // ===== Filter Errors =====
    /// A filter rule has an unknown verb or an invalid pattern
    #[error("Invalid filter rule '{rule}': {reason}")]
    InvalidFilterRule { rule: String, reason: String },

    // ===== Configuration Errors =====
    /// Configuration file missing or malformed
    #[error("Failed to load config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl CairnError {
    /// Build a read error for `path` from an I/O failure
    pub fn read(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        CairnError::Read {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Build a write error for `path` from an I/O failure
    pub fn write(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        CairnError::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Build a malformed-line error
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        CairnError::MalformedManifestLine {
            line,
            reason: reason.into(),
        }
    }
}

impl From<CairnError> for ExError {
    fn from(err: CairnError) -> Self {
        let message = err.to_string();
        match err {
            CairnError::Read { path, .. } => ExError::new(ExErrorKind::Io)
                .with_op("read")
                .with_path(path)
                .with_message(message),
            CairnError::Write { path, .. } => ExError::new(ExErrorKind::Io)
                .with_op("write")
                .with_path(path)
                .with_message(message),
            CairnError::NotADirectory { path } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("walk")
                .with_path(path)
                .with_message(message),
            CairnError::InvalidHash { value, .. } => ExError::new(ExErrorKind::InvalidHash)
                .with_hash(value)
                .with_message(message),
            CairnError::MalformedManifestLine { line, .. } => {
                ExError::new(ExErrorKind::InvalidManifest)
                    .with_op("manifest_load")
                    .with_line(line)
                    .with_message(message)
            }
            CairnError::DuplicateManifestPath { path, line } => {
                ExError::new(ExErrorKind::DuplicateEntry)
                    .with_op("manifest_load")
                    .with_path(path)
                    .with_line(line)
                    .with_message(message)
            }
            CairnError::UnsafeManifestPath { path, .. } => ExError::new(ExErrorKind::InvalidPath)
                .with_path(path)
                .with_message(message),
            CairnError::InvalidFilterRule { .. } => {
                ExError::new(ExErrorKind::InvalidFilter).with_message(message)
            }
            CairnError::Config { path, .. } => ExError::new(ExErrorKind::Config)
                .with_op("config_load")
                .with_path(path)
                .with_message(message),
        }
    }
}
