//! Scanning a directory tree into an input snapshot.

use crate::fs::{FileSystem, MTime};
use crate::snapshot::{Content, Snapshot};
use anyhow::{anyhow, bail};
use rustc_hash::FxHashMap;
use std::path::{Component, Path};

/// Reads a source tree into snapshots across repeated scans.
///
/// A file whose mtime is unchanged since the last scan keeps its previous
/// `Content` handle, which is how the builder learns it did not change.
#[derive(Default)]
pub struct Loader {
    known: FxHashMap<String, (MTime, Content)>,
}

impl Loader {
    pub fn new() -> Self {
        Loader::default()
    }

    pub fn scan(&mut self, fs: &dyn FileSystem, root: &Path) -> anyhow::Result<Snapshot> {
        let paths = fs
            .walk(root)
            .map_err(|err| anyhow!("scan {}: {}", root.display(), err))?;

        let mut known = FxHashMap::default();
        for rel in paths {
            let key = snapshot_key(&rel)?;
            let full = root.join(&rel);
            let mtime = fs
                .stat(&full)
                .map_err(|err| anyhow!("stat {}: {}", full.display(), err))?;
            if mtime == MTime::Missing {
                // Removed between listing and stat.
                continue;
            }
            let content = match self.known.get(&key) {
                Some((prev, content)) if *prev == mtime => content.clone(),
                _ => match fs.read(&full) {
                    Ok(bytes) => Content::from(bytes),
                    Err(e) => bail!("read {}: {}", full.display(), e),
                },
            };
            known.insert(key, (mtime, content));
        }
        self.known = known;

        Ok(self
            .known
            .iter()
            .map(|(path, (_, content))| (path.clone(), content.clone()))
            .collect())
    }
}

/// Convert a relative file system path into a '/'-separated snapshot key.
fn snapshot_key(rel: &Path) -> anyhow::Result<String> {
    let mut key = String::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(name) => {
                let name = name
                    .to_str()
                    .ok_or_else(|| anyhow!("non-UTF-8 path {}", rel.display()))?;
                if !key.is_empty() {
                    key.push('/');
                }
                key.push_str(name);
            }
            Component::CurDir => {}
            _ => bail!("unexpected path component in {}", rel.display()),
        }
    }
    Ok(key)
}
