//! Diffing two input snapshots.

use crate::snapshot::{Content, Snapshot};
use std::collections::BTreeMap;

/// A sparse map of path to new content, where `None` is a tombstone marking
/// a path that was removed.  Paths that did not change are absent.
pub type ChangeMap = BTreeMap<String, Option<Content>>;

/// Compute what changed from `old` to `new`.  With no `old` snapshot (the
/// first pass) every path in `new` is reported.
///
/// Content is compared by identity; see [`crate::snapshot`].
pub fn diff(old: Option<&Snapshot>, new: &Snapshot) -> ChangeMap {
    let old = match old {
        None => {
            return new
                .iter()
                .map(|(path, content)| (path.to_owned(), Some(content.clone())))
                .collect()
        }
        Some(old) => old,
    };

    let mut changes = ChangeMap::new();
    for (path, content) in new.iter() {
        match old.get(path) {
            Some(prev) if prev.same(content) => {}
            _ => {
                changes.insert(path.to_owned(), Some(content.clone()));
            }
        }
    }
    for (path, _) in old.iter() {
        if !new.contains(path) {
            changes.insert(path.to_owned(), None);
        }
    }
    changes
}
