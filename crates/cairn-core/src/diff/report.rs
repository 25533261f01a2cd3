use super::model::ManifestDiff;
use crate::manifest::ManifestEntry;
use std::fmt::Write;

/// File name of the report comparing `previous` with `current`
pub fn report_file_name(previous: &str, current: &str) -> String {
    format!("{}-{}.txt", previous, current)
}

/// Render a diff as the plain-text change report
///
/// Sections appear in the order added, removed, changed, unchanged, and a
/// section is omitted when it has no items. Each item is one tab-indented
/// line.
pub fn render_report(diff: &ManifestDiff) -> String {
    let mut out = String::new();
    section(&mut out, "Added", &diff.added);
    section(&mut out, "Removed", &diff.removed);
    if !diff.changed.is_empty() {
        let _ = writeln!(out, "Changed {} items", diff.changed.len());
        for change in &diff.changed {
            let _ = writeln!(out, "\t{}", change.to_line());
        }
    }
    if !diff.unchanged.is_empty() {
        let _ = writeln!(out, "Listing {} unchanged items", diff.unchanged.len());
        for entry in &diff.unchanged {
            let _ = writeln!(out, "\t{}", entry.to_line());
        }
    }
    out
}

fn section(out: &mut String, title: &str, entries: &[ManifestEntry]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} {} items", title, entries.len());
    for entry in entries {
        let _ = writeln!(out, "\t{}", entry.to_line());
    }
}
