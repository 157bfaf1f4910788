//! Snapshots: immutable maps of relative path to file content.
//!
//! # Identity, not equality
//!
//! A [`Content`] is compared by *identity* when deciding what changed between
//! two snapshots: a path whose new content is a different buffer counts as
//! changed even when the bytes are identical, and a path that keeps the same
//! buffer counts as unchanged.  Callers signal "this file did not change" by
//! handing back the very same `Content` (a clone of it, which shares the
//! allocation).  Do not replace this with byte comparison; it would change
//! which files get rebuilt and cost a full read of every input on every pass.

use crate::canon::{canon_path, escapes_root, is_rooted};
use crate::error::BuildError;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::sync::Arc;

/// An immutable, cheaply clonable byte buffer.
///
/// Deliberately has no `PartialEq`: see the module docs.  Use
/// [`Content::same`] for identity and [`Content::as_bytes`] for bytes.
#[derive(Clone)]
pub struct Content(Arc<[u8]>);

impl Content {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Content(Arc::from(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether both handles refer to the same buffer.
    pub fn same(&self, other: &Content) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Deref for Content {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Content {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content(Arc::from(bytes))
    }
}

impl From<&[u8]> for Content {
    fn from(bytes: &[u8]) -> Self {
        Content(Arc::from(bytes))
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::from(text.into_bytes())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::from(text.as_bytes())
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Content({:?})", self.to_string_lossy())
    }
}

/// An immutable map of normalized relative path to [`Content`].
///
/// Cloning is cheap.  The mutating methods are copy-on-write, so a snapshot
/// handed out earlier never changes underneath its holder.
#[derive(Clone, Default)]
pub struct Snapshot {
    files: Arc<FxHashMap<String, Content>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Snapshot::default()
    }

    pub fn get(&self, path: &str) -> Option<&Content> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Content)> + '_ {
        self.files.iter().map(|(path, content)| (path.as_str(), content))
    }

    /// All paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Content>) {
        Arc::make_mut(&mut self.files).insert(path.into(), content.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<Content> {
        if !self.files.contains_key(path) {
            return None;
        }
        Arc::make_mut(&mut self.files).remove(path)
    }

    pub fn clear(&mut self) {
        self.files = Arc::default();
    }

    /// Check that every key is a normalized relative path.
    pub fn validate(&self) -> Result<(), BuildError> {
        for path in self.files.keys() {
            let reason = if path.is_empty() {
                "empty path"
            } else if is_rooted(path) {
                "absolute path"
            } else if path.ends_with('/') {
                "path names a directory"
            } else if canon_path(path.as_str()) != *path {
                "path is not normalized"
            } else if escapes_root(path) {
                "path escapes the snapshot root"
            } else {
                continue;
            };
            return Err(BuildError::InvalidInput {
                path: path.clone(),
                reason,
            });
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<Content>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let files = iter
            .into_iter()
            .map(|(path, content)| (path.into(), content.into()))
            .collect();
        Snapshot {
            files: Arc::new(files),
        }
    }
}

/// Structural comparison by bytes, for callers and tests.  The build engine
/// itself never uses this; see the module docs.
impl PartialEq for Snapshot {
    fn eq(&self, other: &Snapshot) -> bool {
        self.len() == other.len()
            && self.iter().all(|(path, content)| {
                other
                    .get(path)
                    .map_or(false, |theirs| theirs.as_bytes() == content.as_bytes())
            })
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.paths().into_iter().map(|path| (path, &self.files[path])))
            .finish()
    }
}
