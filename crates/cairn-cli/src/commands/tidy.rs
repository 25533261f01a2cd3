//! Tidy command

use super::{CmdResult, Context};
use cairn_core::Manifest;
use cairn_engine::tidy;
use cairn_store::{open_store, StoreKind};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TidyArgs {
    pub store: PathBuf,

    /// Manifests whose content must be kept
    #[arg(required = true)]
    pub manifests: Vec<PathBuf>,

    /// Treat the store as compressed
    #[arg(long)]
    pub compressed: bool,
}

pub fn execute(ctx: &Context, args: TidyArgs) -> CmdResult {
    let manifests = args
        .manifests
        .iter()
        .map(|path| Manifest::load_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    let kind = if args.compressed {
        StoreKind::Compressed
    } else {
        StoreKind::Raw
    };
    let store = open_store(kind, &args.store, ctx.store_options());

    let report = tidy(&manifests, store.as_ref())?;
    ctx.emit(&report, report.render())
}
