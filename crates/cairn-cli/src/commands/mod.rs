//! Command implementations and the state they share

pub mod diff;
pub mod extract;
pub mod flatten;
pub mod tidy;
pub mod validate;

use crate::GlobalArgs;
use cairn_core::manifest::manifest_file_name;
use cairn_core::progress::pretty_bytes;
use cairn_core::{
    CairnConfig, Manifest, ManifestBuilder, NoopProgress, PathFilter, ProgressObserver,
    TerminalProgress,
};
use cairn_store::cas::ensure_dir;
use cairn_store::StoreOptions;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// One or more source directories
#[derive(Debug, Args)]
pub struct SourcesArgs {
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,
}

/// Configuration merged with command line flags
pub struct Context {
    pub config: CairnConfig,
    pub output_dir: PathBuf,
    pub filter: PathFilter,
    pub quiet: bool,
    pub json: bool,
}

impl Context {
    pub fn new(config: CairnConfig, global: &GlobalArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let output_dir = global
            .output_dir
            .clone()
            .unwrap_or_else(|| config.output_dir.clone());

        let (mut filter, mut rejected) = config.path_filter();
        if let Some(path) = &global.filters {
            let (extra, bad) = PathFilter::load_file(path)?;
            filter.extend(extra);
            rejected.extend(bad);
        }
        for err in &rejected {
            warn!(error = %err, "ignoring filter rule");
        }

        Ok(Self {
            config,
            output_dir,
            filter,
            quiet: global.quiet,
            json: global.json,
        })
    }

    pub fn progress(&self) -> Box<dyn ProgressObserver> {
        if self.quiet {
            Box::new(NoopProgress)
        } else {
            Box::new(TerminalProgress::stderr())
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            compression_level: self.config.compression_level,
            dir_create_retries: self.config.dir_create_retries,
        }
    }

    /// `output_dir` joined with `name`, creating `output_dir` if needed
    pub fn output_path(&self, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        ensure_dir(&self.output_dir, self.config.dir_create_retries)?;
        Ok(self.output_dir.join(name))
    }

    /// Walk `source` and write `<name>_manifest.txt` into the output directory
    pub fn build_manifest(
        &self,
        source: &Path,
        name: &str,
    ) -> Result<Manifest, Box<dyn std::error::Error>> {
        let builder = ManifestBuilder::new(source).with_filter(self.filter.clone());
        let mut progress = self.progress();
        let (manifest, stats) = builder.build(progress.as_mut())?;
        if !self.quiet {
            eprintln!(
                "{}: {} files, {}",
                name,
                stats.files,
                pretty_bytes(stats.bytes)
            );
        }

        manifest.write_file(&self.output_path(&manifest_file_name(name))?)?;
        Ok(manifest)
    }

    /// Print a report as text or JSON
    pub fn emit<T: Serialize>(&self, report: &T, text: String) -> CmdResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            print!("{}", text);
        }
        Ok(())
    }
}

/// Base name of a source directory, used to name its manifest and store
pub fn source_name(source: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let resolved;
    let path = if source.file_name().is_some() {
        source
    } else {
        resolved = source.canonicalize()?;
        resolved.as_path()
    };
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("cannot derive a name from '{}'", source.display()).into())
}
