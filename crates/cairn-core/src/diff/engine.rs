use super::model::{ChangedEntry, ManifestDiff};
use crate::manifest::Manifest;
use std::cmp::Ordering;

/// Partition the paths of `current` and `previous`
///
/// Both manifests iterate in path order, so a single merge pass yields
/// lists that are already sorted.
pub fn diff_manifests(current: &Manifest, previous: &Manifest) -> ManifestDiff {
    let mut diff = ManifestDiff::default();
    let mut cur = current.entries().peekable();
    let mut prev = previous.entries().peekable();

    loop {
        let order = match (cur.peek(), prev.peek()) {
            (Some(c), Some(p)) => c.path.cmp(&p.path),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match order {
            Ordering::Less => diff.added.extend(cur.next().cloned()),
            Ordering::Greater => diff.removed.extend(prev.next().cloned()),
            Ordering::Equal => {
                if let (Some(c), Some(p)) = (cur.next(), prev.next()) {
                    if c.matches(p) {
                        diff.unchanged.push(c.clone());
                    } else {
                        diff.changed.push(ChangedEntry {
                            previous: p.clone(),
                            current: c.clone(),
                        });
                    }
                }
            }
        }
    }

    diff
}
