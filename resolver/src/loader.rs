//! Document text sources and permissive single-file loading.
//!
//! The resolver reads documents through a [`SourceLoader`]. [`FsLoader`]
//! reads from the filesystem; [`MemoryLoader`] serves documents held in
//! memory, which is handy for embedding and tests.
//!
//! [`load_document`] loads one document without include processing and
//! returns `None` instead of an error when it cannot be read or parsed.
//!
//! # Example
//!
//! ```
//! use yaml_include_resolver::{MemoryLoader, load_document_with};
//!
//! let loader = MemoryLoader::new()
//!     .with_document("/conf/app.yaml", "name: app\n")
//!     .with_document("/conf/broken.yaml", "name: [\n");
//!
//! let doc = load_document_with(&loader, "/conf/app.yaml").unwrap();
//! assert_eq!(doc["name"], "app");
//!
//! assert!(load_document_with(&loader, "/conf/broken.yaml").is_none());
//! assert!(load_document_with(&loader, "/conf/missing.yaml").is_none());
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;
use yaml_include_core::{Value, parse_text};

/// Source of document text.
pub trait SourceLoader {
    /// Returns the full text of the document at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the document does not exist or cannot be read as UTF-8.
    fn load_text(&self, path: &Path) -> io::Result<String>;
}

impl<L: SourceLoader + ?Sized> SourceLoader for &L {
    fn load_text(&self, path: &Path) -> io::Result<String> {
        (**self).load_text(path)
    }
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves documents from an in-memory map keyed by path.
///
/// Paths are matched exactly, so register them in canonical form (absolute,
/// without `.` or `..` segments) when resolving includes.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, replacing any previous text for the same path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.documents.insert(path.into(), text.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_document(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl SourceLoader for MemoryLoader {
    fn load_text(&self, path: &Path) -> io::Result<String> {
        self.documents.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no document registered for '{}'", path.display()),
            )
        })
    }
}

/// Loads and parses one file without processing its includes.
///
/// Returns `None` if the file cannot be read or parsed.
///
/// # Examples
///
/// ```no_run
/// use yaml_include_resolver::load_document;
///
/// match load_document("deploy.yaml") {
///     Some(doc) => println!("loaded {} top-level keys", doc.as_object().map_or(0, |o| o.len())),
///     None => println!("nothing usable at deploy.yaml"),
/// }
/// ```
pub fn load_document(path: impl AsRef<Path>) -> Option<Value> {
    load_document_with(&FsLoader, path)
}

/// [`load_document`] reading through a custom [`SourceLoader`].
pub fn load_document_with<L: SourceLoader>(loader: &L, path: impl AsRef<Path>) -> Option<Value> {
    let path = path.as_ref();
    let text = match loader.load_text(path) {
        Ok(text) => text,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "document not readable");
            return None;
        }
    };
    match parse_text(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "document not parseable");
            None
        }
    }
}

/// Loads one file straight into a typed value.
///
/// Returns `None` if the file cannot be read, parsed, or converted to `T`.
pub fn load_document_as<T: DeserializeOwned>(path: impl AsRef<Path>) -> Option<T> {
    let path = path.as_ref();
    let value = load_document(path)?;
    match serde_json::from_value(value) {
        Ok(typed) => Some(typed),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "document has unexpected shape");
            None
        }
    }
}
