//! Diff command: manifests plus pairwise change reports

use super::{source_name, CmdResult, Context, SourcesArgs};
use cairn_core::diff::{render_report, report_file_name};
use cairn_core::Manifest;
use std::fs;
use tracing::info;

pub fn execute(ctx: &Context, args: SourcesArgs) -> CmdResult {
    let mut previous: Option<(String, Manifest)> = None;

    for source in &args.sources {
        let name = source_name(source)?;
        let manifest = ctx.build_manifest(source, &name)?;

        if let Some((prev_name, prev_manifest)) = &previous {
            let diff = manifest.diff(prev_manifest);
            let report_path = ctx.output_path(&report_file_name(prev_name, &name))?;
            fs::write(&report_path, render_report(&diff))?;
            info!(
                previous = %prev_name,
                current = %name,
                added = diff.added.len() as u64,
                removed = diff.removed.len() as u64,
                changed = diff.changed.len() as u64,
                "wrote diff report"
            );
            let summary = format!(
                "{} -> {}: {} added, {} removed, {} changed, {} unchanged\n",
                prev_name,
                name,
                diff.added.len(),
                diff.removed.len(),
                diff.changed.len(),
                diff.unchanged.len()
            );
            ctx.emit(&diff, summary)?;
        }
        previous = Some((name, manifest));
    }
    Ok(())
}
