//! Deciding which build paths need to run in a pass.

use crate::changes::ChangeMap;
use crate::relation::RelationTable;
use crate::snapshot::Snapshot;

/// Expand a change map into the rebuild set: every changed path, plus every
/// build path that imported a changed path last generation.  An importer's
/// entry holds its current content, or a tombstone if it has since been
/// removed.
///
/// The expansion is one level deep: an importer of an importer of a changed
/// file is not picked up unless it also imports the changed file directly.
pub fn select(changes: &ChangeMap, input: &Snapshot, importations: &RelationTable) -> ChangeMap {
    let mut rebuild = changes.clone();
    for changed in changes.keys() {
        for importer in importations.lefts_of(changed) {
            rebuild.insert(importer.to_owned(), input.get(importer).cloned());
        }
    }
    rebuild
}
