//! Validate command

use super::{CmdResult, Context};
use cairn_core::Manifest;
use cairn_engine::validate;
use cairn_store::{open_store, StoreKind};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    pub manifest: PathBuf,
    pub store: PathBuf,

    /// Treat the store as compressed
    #[arg(long)]
    pub compressed: bool,
}

pub fn execute(ctx: &Context, args: ValidateArgs) -> CmdResult {
    let manifest = Manifest::load_file(&args.manifest)?;
    let kind = if args.compressed {
        StoreKind::Compressed
    } else {
        StoreKind::Raw
    };
    let store = open_store(kind, &args.store, ctx.store_options());

    let report = validate(&manifest, store.as_ref());
    ctx.emit(&report, report.render())?;
    if report.is_valid() {
        Ok(())
    } else {
        Err(format!("{} files missing from {}", report.missing.len(), args.store.display()).into())
    }
}
