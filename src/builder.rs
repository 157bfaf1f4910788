//! The incremental builder: sequences a pass and owns the generation state.
//!
//! A pass runs in these steps:
//! 1. diff the new input against the last committed input;
//! 2. expand the changes with direct importers into the rebuild set;
//! 3. run the transform for every rebuild path that still exists;
//! 4. normalize results into explicit outputs, checking each output path has
//!    a single producer;
//! 5. reconcile with the previous generation: carry over the relations of
//!    paths that were not rebuilt, compute which outputs are no longer
//!    produced, and merge the surviving previous outputs into the new ones.
//!
//! The next generation is built as fresh values and only swapped in once all
//! of that succeeded, so a failed pass leaves nothing half-committed.

use crate::changes::{self, ChangeMap};
use crate::emit::{self, Emit};
use crate::error::BuildError;
use crate::relation::{Causations, RelationTable};
use crate::snapshot::{Content, Snapshot};
use crate::task::{self, ImportContext, Imports, TransformFn};
use crate::{trace, work};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// State committed by the last successful pass.
#[derive(Default)]
struct Generation {
    /// None before the first pass.
    input: Option<Snapshot>,
    output: Snapshot,
    /// build path -> paths it imported.
    importations: RelationTable,
    /// build path -> paths it output.
    causations: Causations,
}

/// What a successful pass did.
#[derive(Debug)]
pub struct Outcome {
    /// The complete output snapshot.
    pub output: Snapshot,
    /// Build paths whose transform ran, sorted.
    pub rebuilt: Vec<String>,
    /// Output paths produced last generation but no longer produced, sorted.
    pub deleted: Vec<String>,
}

/// Marks a pass as in flight for as long as it is alive.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Result<Self, BuildError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BuildError::ConcurrentBuild)?;
        Ok(InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Builder {
    transform: Box<TransformFn>,
    building: AtomicBool,
    generation: Mutex<Arc<Generation>>,
}

impl Builder {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(&ImportContext<'_>, &str, &Content) -> anyhow::Result<Emit> + Send + Sync + 'static,
    {
        Builder {
            transform: Box::new(transform),
            building: AtomicBool::new(false),
            generation: Mutex::new(Arc::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Arc<Generation>> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The output committed by the last successful pass.
    pub fn output(&self) -> Snapshot {
        self.lock().output.clone()
    }

    pub fn is_building(&self) -> bool {
        self.building.load(Ordering::Acquire)
    }

    /// Build `input`, returning the complete output snapshot.
    pub fn build(&self, input: Snapshot) -> Result<Snapshot, BuildError> {
        Ok(self.build_outcome(input)?.output)
    }

    /// Like build(), but also reports what the pass rebuilt and retired.
    ///
    /// Fails immediately with [`BuildError::ConcurrentBuild`] if another pass
    /// is running.  On any failure the builder's state is left untouched.
    pub fn build_outcome(&self, input: Snapshot) -> Result<Outcome, BuildError> {
        let _in_flight = InFlight::enter(&self.building)?;
        input.validate()?;

        let prev = Arc::clone(&self.lock());
        let (next, outcome) = trace::scope("pass", || self.pass(&prev, input))?;
        *self.lock() = Arc::new(next);
        Ok(outcome)
    }

    fn pass(&self, prev: &Generation, input: Snapshot) -> Result<(Generation, Outcome), BuildError> {
        let changes = trace::scope("changes", || changes::diff(prev.input.as_ref(), &input));
        let rebuild = trace::scope("select", || {
            work::select(&changes, &input, &prev.importations)
        });

        let imports = Imports::default();
        let emits = trace::scope("transform", || {
            task::run_all(&*self.transform, &rebuild, &input, &imports)
        })?;
        let rebuilt = emits.iter().map(|(path, _)| path.clone()).collect();

        let mut causations = Causations::new();
        let writes = trace::scope("normalize", || collect_outputs(emits, &mut causations))?;

        let mut importations = RelationTable::new();
        for (build_path, paths) in imports {
            for path in &paths {
                importations.add(&build_path, path);
            }
        }

        trace::scope("reconcile", || {
            reconcile(prev, input, &rebuild, importations, causations, writes, rebuilt)
        })
    }
}

/// Normalize every result, claiming output paths in build path order.
fn collect_outputs(
    emits: Vec<(String, Emit)>,
    causations: &mut Causations,
) -> Result<FxHashMap<String, Content>, BuildError> {
    let mut writes = FxHashMap::default();
    for (build_path, emit) in emits {
        for (output_path, content) in emit::normalize(&build_path, emit)? {
            causations
                .claim(&build_path, &output_path)
                .map_err(|owner| BuildError::OutputCollision {
                    build_path: build_path.clone(),
                    output_path: output_path.clone(),
                    owner,
                })?;
            writes.insert(output_path, content);
        }
    }
    Ok(writes)
}

/// Merge this pass's results with what remains valid from `prev`.
fn reconcile(
    prev: &Generation,
    input: Snapshot,
    rebuild: &ChangeMap,
    mut importations: RelationTable,
    mut causations: Causations,
    mut writes: FxHashMap<String, Content>,
    rebuilt: Vec<String>,
) -> Result<(Generation, Outcome), BuildError> {
    // Paths that were not rebuilt keep their relations as they were.
    for (build_path, output_path) in prev.causations.table().pairs() {
        if rebuild.contains_key(build_path) {
            continue;
        }
        causations
            .claim(build_path, output_path)
            .map_err(|owner| BuildError::OutputCollision {
                build_path: owner,
                output_path: output_path.to_owned(),
                owner: build_path.to_owned(),
            })?;
    }
    for (build_path, import_path) in prev.importations.pairs() {
        if !rebuild.contains_key(build_path) {
            importations.add(build_path, import_path);
        }
    }

    let deleted: BTreeSet<&str> = prev
        .causations
        .table()
        .all_rights()
        .filter(|path| !causations.table().has_right(path))
        .collect();

    for (path, content) in prev.output.iter() {
        if !writes.contains_key(path) && !deleted.contains(path) {
            writes.insert(path.to_owned(), content.clone());
        }
    }

    let output: Snapshot = writes.into_iter().collect();
    let deleted = deleted.into_iter().map(str::to_owned).collect();
    let next = Generation {
        input: Some(input),
        output: output.clone(),
        importations,
        causations,
    };
    Ok((
        next,
        Outcome {
            output,
            rebuilt,
            deleted,
        },
    ))
}
