//! TOML configuration
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Command line flags override file values.

use crate::errors::{CairnError, Result};
use crate::logging_facility::Profile;
use crate::manifest::PathFilter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "cairn.toml";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn profile(self) -> Profile {
        match self {
            LogFormat::Human => Profile::Development,
            LogFormat::Json => Profile::Production,
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected human or json", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Json => "json",
        })
    }
}

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CairnConfig {
    /// Directory that receives manifests, reports and stores.
    pub output_dir: PathBuf,
    /// Store name used by `shared`.
    pub shared_store: String,
    /// Store name used by `compressshared`.
    pub compressed_shared_store: String,
    /// zstd level for compressed stores.
    pub compression_level: i32,
    /// Attempts made when creating a store directory.
    pub dir_create_retries: u32,
    /// Filter rules applied to every walk, in `verb<TAB>pattern` form.
    pub filters: Vec<String>,
    pub log_format: LogFormat,
}

impl Default for CairnConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            shared_store: "Cache".to_string(),
            compressed_shared_store: "Cache_Compressed".to_string(),
            compression_level: 3,
            dir_create_retries: 5,
            filters: Vec::new(),
            log_format: LogFormat::Human,
        }
    }
}

impl CairnConfig {
    /// Parse configuration text; `origin` is only used in error messages
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::Config`] for invalid TOML, unknown keys or
    /// wrongly typed values.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        let config: CairnConfig = toml::from_str(text).map_err(|e| CairnError::Config {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Load an explicitly named file
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::Config`] if the file is missing, unreadable or
    /// invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CairnError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::Config`] if the file exists but is invalid.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let invalid = |reason: String| CairnError::Config {
            path: origin.to_path_buf(),
            reason,
        };
        if self.dir_create_retries == 0 {
            return Err(invalid("dir_create_retries must be at least 1".to_string()));
        }
        if !(1..=22).contains(&self.compression_level) {
            return Err(invalid(format!(
                "compression_level {} is outside 1..=22",
                self.compression_level
            )));
        }
        if self.shared_store.is_empty() || self.compressed_shared_store.is_empty() {
            return Err(invalid("shared store names must not be empty".to_string()));
        }
        Ok(())
    }

    /// Compile the configured filter rules
    ///
    /// Bad rules come back in the second element rather than failing.
    pub fn path_filter(&self) -> (PathFilter, Vec<CairnError>) {
        PathFilter::from_lines(&self.filters)
    }

    pub fn logging_profile(&self) -> Profile {
        self.log_format.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_text_is_all_defaults() {
        let config = CairnConfig::from_toml_str("", Path::new("cairn.toml")).unwrap();
        assert_eq!(config, CairnConfig::default());
        assert_eq!(config.shared_store, "Cache");
        assert_eq!(config.dir_create_retries, 5);
        assert!(config.filters.is_empty());

        let (filter, errors) = config.path_filter();
        assert!(errors.is_empty());
        assert!(filter.allows("/a.tmp"));
    }

    #[test]
    fn test_partial_file_overrides_some_fields() {
        let text = r#"
            output_dir = "out"
            compression_level = 9
            log_format = "json"
            filters = ["deny\t*.tmp"]
        "#;
        let config = CairnConfig::from_toml_str(text, Path::new("x.toml")).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.logging_profile(), Profile::Production);
        assert_eq!(config.shared_store, "Cache");

        let (filter, errors) = config.path_filter();
        assert!(errors.is_empty());
        assert!(!filter.allows("/a.tmp"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = CairnConfig::from_toml_str("colour = true", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, CairnError::Config { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(CairnConfig::from_toml_str("dir_create_retries = 0", Path::new("c")).is_err());
        assert!(CairnConfig::from_toml_str("compression_level = 40", Path::new("c")).is_err());
    }

    #[test]
    fn test_missing_default_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        assert_eq!(CairnConfig::load_or_default(&path).unwrap(), CairnConfig::default());
        assert!(CairnConfig::load(&path).is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::Human.to_string(), "human");
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
