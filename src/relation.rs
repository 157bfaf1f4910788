//! Relations between build paths and the paths they touched.
//!
//! Two instances are kept per generation: importations (build path -> paths
//! its transform read) and causations (build path -> paths it produced).
//! They differ in cardinality: any number of build paths may import the same
//! file, but an output path has exactly one producer.

use std::collections::{BTreeMap, BTreeSet};

/// A many-to-many relation of (left, right) string pairs, indexed both ways.
#[derive(Clone, Debug, Default)]
pub struct RelationTable {
    by_left: BTreeMap<String, BTreeSet<String>>,
    by_right: BTreeMap<String, BTreeSet<String>>,
}

impl RelationTable {
    pub fn new() -> Self {
        RelationTable::default()
    }

    /// Add an edge, returning false if it was already present.
    pub fn add(&mut self, left: &str, right: &str) -> bool {
        let added = self
            .by_left
            .entry(left.to_owned())
            .or_default()
            .insert(right.to_owned());
        if added {
            self.by_right
                .entry(right.to_owned())
                .or_default()
                .insert(left.to_owned());
        }
        added
    }

    /// Whether the left key has any edges.
    pub fn has_left(&self, left: &str) -> bool {
        self.by_left.contains_key(left)
    }

    pub fn has_right(&self, right: &str) -> bool {
        self.by_right.contains_key(right)
    }

    pub fn rights_of<'a>(&'a self, left: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.by_left
            .get(left)
            .into_iter()
            .flat_map(|rights| rights.iter().map(String::as_str))
    }

    pub fn lefts_of<'a>(&'a self, right: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.by_right
            .get(right)
            .into_iter()
            .flat_map(|lefts| lefts.iter().map(String::as_str))
    }

    /// All distinct right-hand values, sorted.
    pub fn all_rights(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_right.keys().map(String::as_str)
    }

    /// All (left, right) pairs, sorted by left then right.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.by_left.iter().flat_map(|(left, rights)| {
            rights
                .iter()
                .map(move |right| (left.as_str(), right.as_str()))
        })
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.by_left.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_left.is_empty()
    }
}

/// The causation relation: build path -> output paths, where every output
/// path has a single producer.
#[derive(Clone, Debug, Default)]
pub struct Causations(RelationTable);

impl Causations {
    pub fn new() -> Self {
        Causations::default()
    }

    /// Record that `build_path` produces `output_path`.  Fails with the
    /// existing producer if a different build path already claimed it;
    /// claiming again for the same build path is a no-op.
    pub fn claim(&mut self, build_path: &str, output_path: &str) -> Result<(), String> {
        match self.producer(output_path) {
            Some(owner) if owner == build_path => Ok(()),
            Some(owner) => Err(owner.to_owned()),
            None => {
                self.0.add(build_path, output_path);
                Ok(())
            }
        }
    }

    pub fn producer(&self, output_path: &str) -> Option<&str> {
        self.0.lefts_of(output_path).next()
    }

    pub fn table(&self) -> &RelationTable {
        &self.0
    }
}
