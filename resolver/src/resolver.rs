//! Recursive include resolution.
//!
//! A document may list other documents under its root-level `includes` key.
//! [`IncludeResolver`] loads the document, resolves each include (relative to
//! the including document's directory) depth-first, folds the results
//! together in declaration order, and finally folds the document's own
//! content on top. The directive itself never reaches the output.
//!
//! Cycle detection is scoped to the active include chain: a document may be
//! included from two sibling branches, but never from inside itself.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use yaml_include_resolver::{IncludeResolver, MemoryLoader};
//!
//! let loader = MemoryLoader::new()
//!     .with_document("/conf/main.yaml", "includes: [a.yaml, b.yaml]\nname: main\n")
//!     .with_document("/conf/a.yaml", "name: a\nshared: [1]\n")
//!     .with_document("/conf/b.yaml", "shared: [2]\nowner: b\n");
//!
//! let resolver = IncludeResolver::new().with_loader(loader);
//! let doc = resolver.resolve("/conf/main.yaml").unwrap();
//! assert_eq!(doc, json!({"name": "main", "shared": [1, 2], "owner": "b"}));
//! ```

use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use yaml_include_core::{
    CanonicalPath, Map, MergeConflict, ParseError, Value, canonicalize, merge_values, parse_text,
    resolve_include, string_list, to_yaml_string,
};

use crate::config::ResolverConfig;
use crate::error::{ResolveError, ResolveWarning, Result};
use crate::loader::{FsLoader, SourceLoader};

/// Outcome of [`IncludeResolver::resolve_with_report`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The merged document.
    pub document: Value,
    /// Every document loaded, in load order. A document included from
    /// several branches appears once per inclusion.
    pub files: Vec<PathBuf>,
    /// Recoverable conditions met along the way.
    pub warnings: Vec<ResolveWarning>,
}

/// Resolves documents and their includes into one merged document.
///
/// # Examples
///
/// ```no_run
/// use yaml_include_resolver::{IncludeResolver, ResolverConfig};
///
/// let resolver = IncludeResolver::new().with_config(ResolverConfig::strict());
/// let report = resolver.resolve_with_report("deploy/main.yaml").unwrap();
/// for warning in &report.warnings {
///     eprintln!("warning: {warning}");
/// }
/// println!("{}", report.document);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IncludeResolver<L = FsLoader> {
    config: ResolverConfig,
    loader: L,
}

impl IncludeResolver<FsLoader> {
    /// Creates a resolver reading from the filesystem with the default
    /// configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: SourceLoader> IncludeResolver<L> {
    /// Replaces the configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the document source.
    pub fn with_loader<M: SourceLoader>(self, loader: M) -> IncludeResolver<M> {
        IncludeResolver {
            config: self.config,
            loader,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves `path` and its includes into one document.
    ///
    /// # Errors
    ///
    /// Any unreadable include, malformed document, or circular include
    /// aborts the resolution. Failures below the root are wrapped in
    /// [`ResolveError::Include`] for every including document.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<Value> {
        self.resolve_with_report(path).map(|resolution| resolution.document)
    }

    /// Like [`resolve`](Self::resolve), also reporting the documents loaded
    /// and the warnings raised.
    pub fn resolve_with_report(&self, path: impl AsRef<Path>) -> Result<Resolution> {
        let path = path.as_ref();
        let root = canonicalize(path).map_err(|source| ResolveError::InvalidPath {
            path: path.to_path_buf(),
            source,
        })?;

        let mut chain = ActiveChain::default();
        let mut report = Report::default();
        let document = self.resolve_document(&root, &mut chain, &mut report, true)?;

        Ok(Resolution {
            document,
            files: report.files,
            warnings: report.warnings,
        })
    }

    /// Resolves `path` and deserializes the merged document into `T`.
    ///
    /// # Errors
    ///
    /// As [`resolve`](Self::resolve); a merged document that does not fit
    /// `T` is reported as [`ResolveError::Parse`] on the root path, with the
    /// merged document rendered as YAML for diagnostics.
    pub fn resolve_as<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> Result<T> {
        let path = path.as_ref();
        let document = self.resolve(path)?;
        <T as Deserialize>::deserialize(&document).map_err(|err| ResolveError::Parse {
            path: path.to_path_buf(),
            source: ParseError::new(
                err.to_string(),
                to_yaml_string(&document).unwrap_or_default(),
            ),
        })
    }

    fn resolve_document(
        &self,
        path: &CanonicalPath,
        chain: &mut ActiveChain,
        report: &mut Report,
        is_root: bool,
    ) -> Result<Value> {
        let mut chain = chain.enter(path)?;
        debug!(path = %path, depth = chain.depth(), "resolving document");

        let Some(mut document) = self.load(path, report, is_root)? else {
            return Ok(Value::Object(Map::new()));
        };
        let includes = self.take_includes(&mut document, path, report);

        let options = &self.config.merge;
        let merge_error = |source: MergeConflict| ResolveError::MergeConflict {
            path: path.as_path().to_path_buf(),
            source,
        };

        let mut merged = Value::Object(Map::new());
        for reference in &includes {
            let include = resolve_include(path, reference);
            let resolved = self
                .resolve_document(&include, &mut chain, report, false)
                .map_err(|source| ResolveError::Include {
                    path: path.as_path().to_path_buf(),
                    source: Box::new(source),
                })?;
            merged = merge_values(&merged, &resolved, options).map_err(merge_error)?;
        }

        merge_values(&merged, &document, options).map_err(merge_error)
    }

    fn load(&self, path: &CanonicalPath, report: &mut Report, is_root: bool) -> Result<Option<Value>> {
        let text = match self.loader.load_text(path.as_path()) {
            Ok(text) => text,
            Err(err) if is_root && self.config.lenient_root => {
                let warning = ResolveWarning::MissingRoot {
                    path: path.as_path().to_path_buf(),
                    reason: err.to_string(),
                };
                warn!("{warning}");
                report.warnings.push(warning);
                return Ok(None);
            }
            Err(source) => {
                return Err(ResolveError::FileLoad {
                    path: path.as_path().to_path_buf(),
                    source,
                });
            }
        };

        let document = parse_text(&text).map_err(|source| ResolveError::Parse {
            path: path.as_path().to_path_buf(),
            source,
        })?;
        report.files.push(path.as_path().to_path_buf());
        Ok(Some(document))
    }

    /// Removes the include directive from `document` and returns its entries.
    fn take_includes(&self, document: &mut Value, path: &CanonicalPath, report: &mut Report) -> Vec<String> {
        let Some(directive) = document
            .as_object_mut()
            .and_then(|object| object.shift_remove(&self.config.includes_key))
        else {
            return Vec::new();
        };

        string_list(&directive).unwrap_or_else(|| {
            let warning = ResolveWarning::MalformedIncludes {
                path: path.as_path().to_path_buf(),
            };
            warn!("{warning}");
            report.warnings.push(warning);
            Vec::new()
        })
    }
}

/// Resolves `path` with the default configuration, reading from disk.
///
/// # Examples
///
/// ```no_run
/// let doc = yaml_include_resolver::resolve("config/main.yaml").unwrap();
/// assert!(doc.get("includes").is_none());
/// ```
pub fn resolve(path: impl AsRef<Path>) -> Result<Value> {
    IncludeResolver::new().resolve(path)
}

/// Resolves `path` with the default configuration, reporting loaded
/// documents and warnings.
pub fn resolve_with_report(path: impl AsRef<Path>) -> Result<Resolution> {
    IncludeResolver::new().resolve_with_report(path)
}

#[derive(Debug, Default)]
struct Report {
    files: Vec<PathBuf>,
    warnings: Vec<ResolveWarning>,
}

/// Documents currently being resolved, from the root down.
#[derive(Debug, Default)]
struct ActiveChain {
    stack: Vec<CanonicalPath>,
    members: HashSet<CanonicalPath>,
}

impl ActiveChain {
    /// Pushes `path`, failing if it is already on the chain. The entry is
    /// popped when the returned guard drops.
    fn enter(&mut self, path: &CanonicalPath) -> Result<ChainGuard<'_>> {
        if self.members.contains(path) {
            let chain = self
                .stack
                .iter()
                .chain(std::iter::once(path))
                .map(|entry| entry.as_path().to_path_buf())
                .collect();
            return Err(ResolveError::CircularInclude {
                path: path.as_path().to_path_buf(),
                chain,
            });
        }
        self.members.insert(path.clone());
        self.stack.push(path.clone());
        Ok(ChainGuard { chain: self })
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }
}

struct ChainGuard<'a> {
    chain: &'a mut ActiveChain,
}

impl Deref for ChainGuard<'_> {
    type Target = ActiveChain;

    fn deref(&self) -> &ActiveChain {
        self.chain
    }
}

impl DerefMut for ChainGuard<'_> {
    fn deref_mut(&mut self) -> &mut ActiveChain {
        self.chain
    }
}

impl Drop for ChainGuard<'_> {
    fn drop(&mut self) {
        if let Some(path) = self.chain.stack.pop() {
            self.chain.members.remove(&path);
        }
    }
}
