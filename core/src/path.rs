//! Canonical path identities for include resolution.
//!
//! A [`CanonicalPath`] is absolute and lexically normalized: `.` segments are
//! dropped and `..` segments remove their parent, so equivalent spellings of
//! one file compare equal. Normalization never touches the filesystem and
//! does not follow symlinks.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use yaml_include_core::{canonicalize_from, resolve_include};
//!
//! let root = canonicalize_from(Path::new("/srv/conf"), "./main.yaml");
//! assert_eq!(root.as_path(), Path::new("/srv/conf/main.yaml"));
//!
//! let shared = resolve_include(&root, "../shared/base.yaml");
//! assert_eq!(shared.as_path(), Path::new("/srv/shared/base.yaml"));
//! ```

use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Absolute, normalized path used to identify a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath(PathBuf);

impl CanonicalPath {
    /// Borrows the underlying path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Directory that relative includes of this document resolve against.
    pub fn parent_dir(&self) -> &Path {
        self.0.parent().unwrap_or(&self.0)
    }

    /// Unwraps into a [`PathBuf`].
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

/// Canonicalizes `path` against the process working directory.
///
/// # Errors
///
/// Fails only if `path` is relative and the working directory cannot be
/// determined.
pub fn canonicalize(path: impl AsRef<Path>) -> io::Result<CanonicalPath> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(CanonicalPath(normalize(path)));
    }
    let cwd = std::env::current_dir()?;
    Ok(canonicalize_from(&cwd, path))
}

/// Canonicalizes `path` against an explicit base directory.
///
/// Absolute paths ignore `base_dir`.
pub fn canonicalize_from(base_dir: &Path, path: impl AsRef<Path>) -> CanonicalPath {
    CanonicalPath(normalize(&base_dir.join(path)))
}

/// Resolves an include reference found in `including`.
///
/// Relative references are taken from the directory of the including
/// document; absolute ones are only normalized.
pub fn resolve_include(including: &CanonicalPath, reference: impl AsRef<Path>) -> CanonicalPath {
    canonicalize_from(including.parent_dir(), reference)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_dot_segments() {
        let path = canonicalize_from(Path::new("/a"), "b/./c/../d.yaml");
        assert_eq!(path.as_path(), Path::new("/a/b/d.yaml"));
    }

    #[test]
    fn test_equivalent_spellings_compare_equal() {
        let one = canonicalize_from(Path::new("/etc/app"), "conf/x.yaml");
        let two = canonicalize_from(Path::new("/etc"), "./app/other/../conf/x.yaml");
        assert_eq!(one, two);
    }

    #[test]
    fn test_parent_dir_never_climbs_above_root() {
        let path = canonicalize_from(Path::new("/"), "../../x.yaml");
        assert_eq!(path.as_path(), Path::new("/x.yaml"));
    }

    #[test]
    fn test_absolute_reference_ignores_base() {
        let path = canonicalize_from(Path::new("/base"), "/abs/./file.yaml");
        assert_eq!(path.as_path(), Path::new("/abs/file.yaml"));
    }

    #[test]
    fn test_resolve_include_uses_including_directory() {
        let including = canonicalize_from(Path::new("/proj"), "conf/main.yaml");
        let include = resolve_include(&including, "parts/db.yaml");
        assert_eq!(include.as_path(), Path::new("/proj/conf/parts/db.yaml"));

        let sibling = resolve_include(&including, "../common.yaml");
        assert_eq!(sibling.as_path(), Path::new("/proj/common.yaml"));
    }

    #[test]
    fn test_canonicalize_relative_uses_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        let path = canonicalize("some/./file.yaml").unwrap();
        assert_eq!(path.as_path(), cwd.join("some/file.yaml"));
        assert!(path.as_path().is_absolute());
    }

    #[test]
    fn test_display_matches_path() {
        let path = canonicalize_from(Path::new("/x"), "y.yaml");
        assert_eq!(path.to_string(), "/x/y.yaml");
    }
}
