//! Errors that fail a build pass.
//!
//! Every variant is fatal to the whole pass: nothing is committed, and the
//! builder's state is exactly as it was before the call.

/// Boxed error produced by a transform.
pub type TransformError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// build() was called while another pass was still running.
    #[error("a build is already in flight; wait for it to finish before calling build() again")]
    ConcurrentBuild,

    /// The input snapshot has a key that is not a normalized relative path.
    #[error("invalid input path {path:?}: {reason}")]
    InvalidInput { path: String, reason: &'static str },

    /// A transform tried to write to a rooted path, or one naming no file.
    #[error("when building {build_path:?}, the transform tried to output to invalid path {output_path:?}")]
    InvalidOutputPath {
        build_path: String,
        output_path: String,
    },

    /// Two build paths (or one build path, twice) claimed the same output.
    #[error(
        "when building {build_path:?}, the transform tried to output to {output_path:?}, \
         but this has already been output by {owner:?}"
    )]
    OutputCollision {
        build_path: String,
        output_path: String,
        owner: String,
    },

    /// The transform itself failed.
    #[error("when building {build_path:?}: {source}")]
    Transform {
        build_path: String,
        #[source]
        source: TransformError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_names_both_paths() {
        let err = BuildError::OutputCollision {
            build_path: "b.js".to_string(),
            output_path: "bundle.js".to_string(),
            owner: "a.js".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"b.js\""));
        assert!(msg.contains("\"bundle.js\""));
        assert!(msg.contains("already been output by \"a.js\""));
    }

    #[test]
    fn transform_keeps_source() {
        let source: TransformError = anyhow::anyhow!("syntax error on line 3").into();
        let err = BuildError::Transform {
            build_path: "main.js".to_string(),
            source,
        };
        assert_eq!(
            err.to_string(),
            "when building \"main.js\": syntax error on line 3"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_input_display() {
        let err = BuildError::InvalidInput {
            path: "/etc/passwd".to_string(),
            reason: "absolute path",
        };
        assert_eq!(
            err.to_string(),
            "invalid input path \"/etc/passwd\": absolute path"
        );
    }
}
