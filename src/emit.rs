//! What a transform returns, and normalizing that into explicit outputs.

use crate::canon::{canon_path, is_rooted};
use crate::error::BuildError;
use crate::snapshot::Content;

/// The result of transforming one build path.
#[derive(Debug)]
pub enum Emit {
    /// Produce no output.
    Nothing,
    /// Produce a single file at the build path itself.
    Same(Content),
    /// Produce these files, keyed by output path.
    Files(Vec<(String, Content)>),
}

impl Emit {
    /// A single output at an explicit path.
    pub fn file(path: impl Into<String>, content: impl Into<Content>) -> Self {
        Emit::Files(vec![(path.into(), content.into())])
    }
}

impl From<Content> for Emit {
    fn from(content: Content) -> Self {
        Emit::Same(content)
    }
}

impl From<Vec<u8>> for Emit {
    fn from(bytes: Vec<u8>) -> Self {
        Emit::Same(bytes.into())
    }
}

impl From<String> for Emit {
    fn from(text: String) -> Self {
        Emit::Same(text.into())
    }
}

impl From<&str> for Emit {
    fn from(text: &str) -> Self {
        Emit::Same(text.into())
    }
}

impl<T: Into<Emit>> From<Option<T>> for Emit {
    fn from(value: Option<T>) -> Self {
        value.map_or(Emit::Nothing, Into::into)
    }
}

impl<K: Into<String>, V: Into<Content>> FromIterator<(K, V)> for Emit {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Emit::Files(
            iter.into_iter()
                .map(|(path, content)| (path.into(), content.into()))
                .collect(),
        )
    }
}

/// Turn a transform's result into an explicit list of (output path, content),
/// with output paths canonicalized.  Uniqueness across the pass is checked by
/// the caller once every transform has settled.
pub fn normalize(build_path: &str, emit: Emit) -> Result<Vec<(String, Content)>, BuildError> {
    let files = match emit {
        Emit::Nothing => return Ok(Vec::new()),
        Emit::Same(content) => return Ok(vec![(build_path.to_owned(), content)]),
        Emit::Files(files) => files,
    };

    let mut outputs = Vec::with_capacity(files.len());
    for (path, content) in files {
        if is_rooted(&path) {
            return Err(BuildError::InvalidOutputPath {
                build_path: build_path.to_owned(),
                output_path: path,
            });
        }
        let canon = canon_path(path.as_str());
        if canon.is_empty() || canon.ends_with('/') {
            return Err(BuildError::InvalidOutputPath {
                build_path: build_path.to_owned(),
                output_path: path,
            });
        }
        outputs.push((canon, content));
    }
    Ok(outputs)
}
