//! Runs transforms for a pass, in parallel.
//! Unaware of the generation state; just invocation and import recording.

use crate::canon::{canon_path, is_rooted};
use crate::changes::ChangeMap;
use crate::emit::Emit;
use crate::error::BuildError;
use crate::snapshot::{Content, Snapshot};
use dashmap::DashMap;
use rayon::prelude::*;
use rustc_hash::FxHasher;
use std::collections::BTreeSet;
use std::hash::BuildHasherDefault;

/// The user-supplied transform: (import capability, build path, content).
pub type TransformFn =
    dyn Fn(&ImportContext<'_>, &str, &Content) -> anyhow::Result<Emit> + Send + Sync;

/// Importation edges recorded during a pass, keyed by build path.  Each
/// invocation only ever writes its own key.
pub type Imports = DashMap<String, BTreeSet<String>, BuildHasherDefault<FxHasher>>;

/// The capability handed to a transform, scoped to one build path.
pub struct ImportContext<'a> {
    build_path: &'a str,
    input: &'a Snapshot,
    imports: &'a Imports,
}

impl<'a> ImportContext<'a> {
    pub(crate) fn new(build_path: &'a str, input: &'a Snapshot, imports: &'a Imports) -> Self {
        ImportContext {
            build_path,
            input,
            imports,
        }
    }

    pub fn build_path(&self) -> &str {
        self.build_path
    }

    /// Read another input file, recording that this build path depends on it.
    /// Returns None if the file is not in the input.
    ///
    /// # Panics
    ///
    /// Panics if `path` is rooted; imports are always relative to the input.
    pub fn import_file(&self, path: &str) -> Option<Content> {
        assert!(
            !is_rooted(path),
            "when building {:?}: import_file({:?}) must be given a relative path",
            self.build_path,
            path
        );
        let path = canon_path(path);
        let content = self.input.get(&path).cloned();
        self.imports
            .entry(self.build_path.to_owned())
            .or_default()
            .insert(path);
        content
    }
}

/// Invoke the transform for every entry of the rebuild set that still has
/// content.  Results come back in build path order; the first failure in
/// that order fails the pass.
pub fn run_all(
    transform: &TransformFn,
    rebuild: &ChangeMap,
    input: &Snapshot,
    imports: &Imports,
) -> Result<Vec<(String, Emit)>, BuildError> {
    let jobs: Vec<(&str, &Content)> = rebuild
        .iter()
        .filter_map(|(path, content)| content.as_ref().map(|c| (path.as_str(), c)))
        .collect();

    let results: Vec<(&str, anyhow::Result<Emit>)> = jobs
        .par_iter()
        .map(|&(path, content)| {
            let context = ImportContext::new(path, input, imports);
            (path, transform(&context, path, content))
        })
        .collect();

    let mut emits = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(emit) => emits.push((path.to_owned(), emit)),
            Err(err) => {
                return Err(BuildError::Transform {
                    build_path: path.to_owned(),
                    source: err.into(),
                })
            }
        }
    }
    Ok(emits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tombstones_are_not_dispatched() {
        let input: Snapshot = [("a.txt", "a")].into_iter().collect();
        let mut rebuild = ChangeMap::new();
        rebuild.insert("a.txt".to_string(), input.get("a.txt").cloned());
        rebuild.insert("gone.txt".to_string(), None);

        let imports = Imports::default();
        let transform: &TransformFn = &|_, path, _| {
            assert_ne!(path, "gone.txt");
            Ok(Emit::Nothing)
        };
        let emits = run_all(transform, &rebuild, &input, &imports).unwrap();
        assert_eq!(emits.len(), 1);
        assert_eq!(emits[0].0, "a.txt");
    }

    #[test]
    fn imports_are_recorded_per_build_path() {
        let input: Snapshot = [("a.js", "a"), ("b.js", "b"), ("banner.txt", "(c)")]
            .into_iter()
            .collect();
        let rebuild: ChangeMap = input
            .iter()
            .map(|(path, content)| (path.to_string(), Some(content.clone())))
            .collect();

        let imports = Imports::default();
        let transform: &TransformFn = &|cx, path, _| {
            if path.ends_with(".js") {
                let banner = cx.import_file("./banner.txt");
                assert!(banner.is_some());
                assert!(cx.import_file("missing.txt").is_none());
            }
            Ok(Emit::Nothing)
        };
        run_all(transform, &rebuild, &input, &imports).unwrap();

        assert_eq!(imports.len(), 2);
        let a = imports.get("a.js").unwrap();
        assert_eq!(
            a.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["banner.txt", "missing.txt"]
        );
        assert!(imports.get("banner.txt").is_none());
    }

    #[test]
    fn failure_names_build_path() {
        let input: Snapshot = [("a.txt", "a"), ("b.txt", "b")].into_iter().collect();
        let rebuild: ChangeMap = input
            .iter()
            .map(|(path, content)| (path.to_string(), Some(content.clone())))
            .collect();
        let imports = Imports::default();
        let transform: &TransformFn = &|_, path, _| {
            if path == "b.txt" {
                anyhow::bail!("bad syntax");
            }
            Ok(Emit::Nothing)
        };
        match run_all(transform, &rebuild, &input, &imports) {
            Err(BuildError::Transform { build_path, source }) => {
                assert_eq!(build_path, "b.txt");
                assert_eq!(source.to_string(), "bad syntax");
            }
            other => panic!("unexpected {:?}", other.map(|e| e.len())),
        }
    }
}
