//! Error and warning types for include resolution.
//!
//! Fatal conditions are [`ResolveError`] variants and abort the whole
//! resolution. A failure inside an included document is wrapped once per
//! including document in [`ResolveError::Include`], so the error chain names
//! every file from the root down to the one that failed.
//!
//! Recoverable conditions are [`ResolveWarning`]s: they are logged and
//! collected, and resolution carries on.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use yaml_include_core::{MergeConflict, ParseError};

/// Errors that abort a resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The document could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    FileLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("failed to write '{}': {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be rendered as YAML.
    #[error("failed to serialize '{}': {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document is not well-formed YAML or JSON.
    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// The document is already part of the active include chain.
    #[error("circular include detected for '{}'", .path.display())]
    CircularInclude {
        path: PathBuf,
        /// Active chain from the root, ending with the revisited document.
        chain: Vec<PathBuf>,
    },

    /// Merging under [`KeyConflictPolicy::Error`](yaml_include_core::KeyConflictPolicy::Error) failed.
    #[error("merge conflict in '{}': {source}", .path.display())]
    MergeConflict {
        path: PathBuf,
        #[source]
        source: MergeConflict,
    },

    /// The path could not be made absolute.
    #[error("invalid path '{}': {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A failure while resolving one of the includes of `path`.
    #[error("error processing '{}': {source}", .path.display())]
    Include {
        path: PathBuf,
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    /// The innermost error, with every [`Include`](Self::Include) wrapper
    /// removed.
    pub fn root_cause(&self) -> &ResolveError {
        let mut current = self;
        while let ResolveError::Include { source, .. } = current {
            current = &**source;
        }
        current
    }

    /// Documents involved in the failure, outermost first.
    ///
    /// The last entry is the document that failed.
    pub fn include_chain(&self) -> Vec<&PathBuf> {
        let mut chain = Vec::new();
        let mut current = self;
        loop {
            match current {
                ResolveError::Include { path, source } => {
                    chain.push(path);
                    current = &**source;
                }
                ResolveError::FileLoad { path, .. }
                | ResolveError::FileWrite { path, .. }
                | ResolveError::Serialize { path, .. }
                | ResolveError::Parse { path, .. }
                | ResolveError::CircularInclude { path, .. }
                | ResolveError::MergeConflict { path, .. }
                | ResolveError::InvalidPath { path, .. } => {
                    chain.push(path);
                    return chain;
                }
            }
        }
    }

    /// The parse failure behind this error, if that is what it is.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self.root_cause() {
            ResolveError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`ResolveError`].
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Conditions that are reported but do not stop resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// The `includes` directive is not a list of strings and was ignored.
    MalformedIncludes { path: PathBuf },
    /// The root document could not be read and was treated as empty.
    MissingRoot { path: PathBuf, reason: String },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::MalformedIncludes { path } => write!(
                f,
                "could not parse the includes directive in '{}'; treating it as empty",
                path.display()
            ),
            ResolveWarning::MissingRoot { path, reason } => write!(
                f,
                "could not read '{}' ({reason}); treating it as an empty document",
                path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> ResolveError {
        ResolveError::Include {
            path: "/root.yaml".into(),
            source: Box::new(ResolveError::Include {
                path: "/mid.yaml".into(),
                source: Box::new(ResolveError::FileLoad {
                    path: "/leaf.yaml".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                }),
            }),
        }
    }

    #[test]
    fn test_root_cause_unwraps_include_layers() {
        let err = nested();
        assert!(matches!(err.root_cause(), ResolveError::FileLoad { .. }));
    }

    #[test]
    fn test_include_chain_lists_outermost_first() {
        let err = nested();
        let chain: Vec<String> = err
            .include_chain()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        assert_eq!(chain, ["/root.yaml", "/mid.yaml", "/leaf.yaml"]);
    }

    #[test]
    fn test_display_names_each_file() {
        let message = nested().to_string();
        assert!(message.contains("/root.yaml"));
        assert!(message.contains("/mid.yaml"));
        assert!(message.contains("/leaf.yaml"));
        assert!(message.contains("gone"));
    }

    #[test]
    fn test_write_errors_say_write() {
        let err = ResolveError::FileWrite {
            path: "/out/resolver.yaml".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to write '/out/resolver.yaml': denied");
        assert_eq!(err.include_chain().len(), 1);
    }

    #[test]
    fn test_parse_error_accessor() {
        let err = ResolveError::Include {
            path: "/a.yaml".into(),
            source: Box::new(ResolveError::Parse {
                path: "/b.yaml".into(),
                source: ParseError::new("bad", "x: ["),
            }),
        };
        assert_eq!(err.parse_error().unwrap().source_text(), "x: [");
        assert!(nested().parse_error().is_none());
    }
}
