//! Recursive resolution of YAML documents linked by `includes` directives.
//!
//! A document names other documents under its root-level `includes` key;
//! each is resolved relative to the including document's directory, merged
//! in declaration order, and the including document's own content is merged
//! on top. Resolution is depth-first and cycle-safe, and any unreadable or
//! malformed include fails the whole resolution.
//!
//! # Quick start
//!
//! ```no_run
//! use yaml_include_resolver::{IncludeResolver, ResolverConfig, resolve};
//!
//! // Default configuration, reading from disk
//! let doc = resolve("config/main.yaml").unwrap();
//! println!("{doc}");
//!
//! // Fail instead of returning an empty document when the root is missing
//! let resolver = IncludeResolver::new().with_config(ResolverConfig::strict());
//! let report = resolver.resolve_with_report("config/main.yaml").unwrap();
//! println!("merged {} file(s)", report.files.len());
//! ```
//!
//! Single documents can be loaded without include processing through the
//! permissive [`load_document`], and in-memory text parsed with
//! [`parse_text`].

mod config;
mod error;
mod loader;
mod resolver;

pub use config::{DEFAULT_INCLUDES_KEY, ResolverConfig};
pub use error::{ResolveError, ResolveWarning, Result};
pub use loader::{
    FsLoader, MemoryLoader, SourceLoader, load_document, load_document_as, load_document_with,
};
pub use resolver::{IncludeResolver, Resolution, resolve, resolve_with_report};
pub use yaml_include_core::{
    ArrayConflictPolicy, KeyConflictPolicy, MergeOptions, ParseError, Value, parse_text,
};
