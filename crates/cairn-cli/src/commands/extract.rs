//! Extract command
//!
//! Each spec is either `manifest:storePath` or a store directory named
//! `<base>_<Kind>` whose manifest is `<base>_manifest.txt` beside it. The
//! tree is rebuilt into `<manifest stem>_Extracted` next to the manifest.

use super::{CmdResult, Context};
use cairn_core::manifest::MANIFEST_SUFFIX;
use cairn_core::Manifest;
use cairn_engine::{extract, ExtractOptions};
use cairn_store::cas::prepare_root;
use cairn_store::{open_store, StoreKind};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// `manifest:storePath` or `<base>_<Kind>` store directory
    #[arg(required = true)]
    pub specs: Vec<String>,
}

/// A resolved extraction request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSpec {
    pub manifest: PathBuf,
    pub store: PathBuf,
    pub kind: StoreKind,
}

impl ExtractSpec {
    pub fn parse(spec: &str) -> Result<Self, String> {
        let (manifest, store) = match spec.split_once(':') {
            Some((manifest, store)) if !manifest.is_empty() && !store.is_empty() => {
                (PathBuf::from(manifest), PathBuf::from(store))
            }
            Some(_) => return Err(format!("malformed extract spec '{}'", spec)),
            None => {
                let store = PathBuf::from(spec);
                let dir_name = store
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| format!("malformed extract spec '{}'", spec))?;
                let (base, _) = dir_name.rsplit_once('_').ok_or_else(|| {
                    format!("store '{}' is not named <base>_<Kind>", spec)
                })?;
                let manifest = store.with_file_name(format!("{}{}", base, MANIFEST_SUFFIX));
                (manifest, store)
            }
        };
        let kind = store_kind_for(&store);
        Ok(Self {
            manifest,
            store,
            kind,
        })
    }

    /// `<manifest stem>_Extracted`, beside the manifest
    pub fn target(&self) -> PathBuf {
        let stem = self
            .manifest
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.manifest.with_file_name(format!("{}_Extracted", stem))
    }
}

/// The `_<Kind>` suffix of the store directory name picks the backend.
///
/// Anything unrecognised opens as compressed, which also reads raw entries.
fn store_kind_for(store: &Path) -> StoreKind {
    store
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.rsplit_once('_'))
        .and_then(|(_, suffix)| suffix.parse().ok())
        .unwrap_or(StoreKind::Compressed)
}

pub fn execute(ctx: &Context, args: ExtractArgs) -> CmdResult {
    for raw in &args.specs {
        let spec = ExtractSpec::parse(raw)?;
        if !spec.manifest.is_file() {
            return Err(format!(
                "failed to find required manifest file {}",
                spec.manifest.display()
            )
            .into());
        }
        if !spec.store.is_dir() {
            return Err(format!("store {} is not a directory", spec.store.display()).into());
        }

        let manifest = Manifest::load_file(&spec.manifest)?;
        let store = open_store(spec.kind, &spec.store, ctx.store_options());
        let target = spec.target();
        info!(
            manifest = %spec.manifest.display(),
            store_kind = %spec.kind,
            target = %target.display(),
            "extracting"
        );
        prepare_root(&target, true, ctx.config.dir_create_retries)?;

        let mut progress = ctx.progress();
        let options = ExtractOptions {
            dir_create_retries: ctx.config.dir_create_retries,
        };
        let report = extract(&manifest, store.as_ref(), &target, options, progress.as_mut())?;
        ctx.emit(&report, report.render())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_explicit_pair() {
        let spec = ExtractSpec::parse("out/v1_manifest.txt:out/Cache_Compressed").unwrap();
        assert_eq!(spec.manifest, PathBuf::from("out/v1_manifest.txt"));
        assert_eq!(spec.store, PathBuf::from("out/Cache_Compressed"));
        assert_eq!(spec.kind, StoreKind::Compressed);
        assert_eq!(spec.target(), PathBuf::from("out/v1_manifest_Extracted"));
    }

    #[test]
    fn test_parse_store_directory() {
        let spec = ExtractSpec::parse("out/my_app_Flattened").unwrap();
        assert_eq!(spec.manifest, PathBuf::from("out/my_app_manifest.txt"));
        assert_eq!(spec.kind, StoreKind::Raw);
    }

    #[test]
    fn test_unrecognised_store_name_opens_compressed() {
        let spec = ExtractSpec::parse("v1_manifest.txt:Blobs").unwrap();
        assert_eq!(spec.kind, StoreKind::Compressed);
        let spec = ExtractSpec::parse("v1_manifest.txt:Cache").unwrap();
        assert_eq!(spec.kind, StoreKind::Compressed);
        let spec = ExtractSpec::parse("v1_manifest.txt:out/v1_Raw").unwrap();
        assert_eq!(spec.kind, StoreKind::Raw);
    }

    #[test]
    fn test_parse_rejects_unsuffixed_store() {
        assert!(ExtractSpec::parse("Cache").is_err());
        assert!(ExtractSpec::parse(":store").is_err());
    }
}
