//! Structured values, merge policies, and path identities for YAML include
//! resolution.
//!
//! This crate holds the pure building blocks used by the resolver:
//!
//! - [`parse_text`] / [`to_yaml_string`] / [`to_json_string`] convert
//!   between YAML or JSON text and a [`Value`] tree (objects, arrays,
//!   scalars, null).
//! - [`string_list`] is the typed view used to read an `includes` directive.
//! - [`merge_values`] deep merges two values under a [`MergeOptions`]
//!   ([`KeyConflictPolicy`] for scalars, [`ArrayConflictPolicy`] for arrays).
//! - [`canonicalize`] / [`resolve_include`] produce absolute,
//!   normalized [`CanonicalPath`] identities for cycle detection.
//!
//! # Example
//!
//! ```
//! use yaml_include_core::*;
//!
//! let base = parse_text("name: base\nshared: [1]\n").unwrap();
//! let overlay = parse_text("shared: [2]\nowner: b\n").unwrap();
//!
//! let merged = merge_values(&base, &overlay, &MergeOptions::default()).unwrap();
//! assert_eq!(merged["name"], "base");
//! assert_eq!(merged["shared"], serde_json::json!([1, 2]));
//! assert_eq!(merged["owner"], "b");
//! ```

mod merge;
mod path;
mod value;

pub use merge::{ArrayConflictPolicy, KeyConflictPolicy, MergeConflict, MergeOptions, merge_values};
pub use path::{CanonicalPath, canonicalize, canonicalize_from, resolve_include};
pub use serde_json::{Map, Value};
pub use value::{
    ParseError, parse_text, parse_text_as, string_list, to_json_string, to_yaml_string,
};
