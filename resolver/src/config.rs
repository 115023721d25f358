//! Resolver configuration.
//!
//! Controls the name of the include directive, whether a missing root
//! document is tolerated, and the merge policies used to fold documents
//! together. Every field has a default, so an empty file is a valid
//! configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! includes_key: includes
//! lenient_root: false
//! merge:
//!   key_policy: value_from_second
//!   array_policy: append_second_to_first
//!   recursive: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use yaml_include_core::{MergeOptions, ParseError, parse_text};

use crate::error::{ResolveError, Result};

/// Directive key recognized at the root of a document.
pub const DEFAULT_INCLUDES_KEY: &str = "includes";

/// Settings for an [`IncludeResolver`](crate::IncludeResolver).
///
/// # Examples
///
/// ```
/// use yaml_include_resolver::ResolverConfig;
///
/// let config = ResolverConfig::default();
/// assert_eq!(config.includes_key, "includes");
/// assert!(config.lenient_root);
///
/// let strict = ResolverConfig::strict();
/// assert!(!strict.lenient_root);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Root-level key holding the list of included documents.
    pub includes_key: String,
    /// Treat an unreadable root document as empty instead of failing.
    /// Unreadable includes always fail.
    pub lenient_root: bool,
    /// Policies used to fold includes and the document's own content.
    pub merge: MergeOptions,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            includes_key: DEFAULT_INCLUDES_KEY.to_string(),
            lenient_root: true,
            merge: MergeOptions::default(),
        }
    }
}

impl ResolverConfig {
    /// Default configuration that fails when the root document is missing.
    pub fn strict() -> Self {
        Self {
            lenient_root: false,
            ..Self::default()
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`FileLoad`](ResolveError::FileLoad) if the file cannot be
    /// read, or [`Parse`](ResolveError::Parse) if it is not a valid
    /// configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let parse_error = |source: ParseError| ResolveError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let text = std::fs::read_to_string(path).map_err(|source| ResolveError::FileLoad {
            path: path.to_path_buf(),
            source,
        })?;

        // Empty and comment-only files both parse to null.
        let value = parse_text(&text).map_err(parse_error)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|err| parse_error(ParseError::new(err.to_string(), text)))
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`FileWrite`](ResolveError::FileWrite) if the file cannot be
    /// created, or [`Serialize`](ResolveError::Serialize) if writing the
    /// YAML fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| ResolveError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self).map_err(|source| ResolveError::Serialize {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads configuration from any YAML reader.
    pub fn from_reader(reader: impl std::io::Read) -> serde_yaml::Result<Self> {
        serde_yaml::from_reader(BufReader::new(reader))
    }
}
