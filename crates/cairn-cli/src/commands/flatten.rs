//! Flatten family: flatten, shared, compress, compressshared

use super::{source_name, CmdResult, Context, SourcesArgs};
use cairn_engine::{flatten, FlattenOptions};
use cairn_store::{open_store, StoreKind};

/// Which store a source is flattened into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `<name>_Flattened`, raw, reset
    Flatten,
    /// Shared raw store, kept
    Shared,
    /// `<name>_Compressed`, compressed, reset
    Compress,
    /// Shared compressed store, kept
    CompressShared,
}

impl Mode {
    pub fn kind(self) -> StoreKind {
        match self {
            Mode::Flatten | Mode::Shared => StoreKind::Raw,
            Mode::Compress | Mode::CompressShared => StoreKind::Compressed,
        }
    }

    pub fn reset(self) -> bool {
        matches!(self, Mode::Flatten | Mode::Compress)
    }

    pub fn store_name(self, source: &str, ctx: &Context) -> String {
        match self {
            Mode::Flatten => format!("{}_Flattened", source),
            Mode::Shared => ctx.config.shared_store.clone(),
            Mode::Compress => format!("{}_Compressed", source),
            Mode::CompressShared => ctx.config.compressed_shared_store.clone(),
        }
    }
}

pub fn execute(ctx: &Context, mode: Mode, args: SourcesArgs) -> CmdResult {
    let options = FlattenOptions {
        reset: mode.reset(),
        dir_create_retries: ctx.config.dir_create_retries,
    };

    for source in &args.sources {
        let name = source_name(source)?;
        let manifest = ctx.build_manifest(source, &name)?;

        let store_root = ctx.output_path(&mode.store_name(&name, ctx))?;
        let store = open_store(mode.kind(), store_root, ctx.store_options());
        let mut progress = ctx.progress();
        let report = flatten(&manifest, source, store.as_ref(), options, progress.as_mut())?;
        ctx.emit(&report, report.render())?;
    }
    Ok(())
}
