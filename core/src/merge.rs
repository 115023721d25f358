//! Deep merging of structured values with configurable conflict policies.
//!
//! [`merge_values`] folds a `second` document onto a `first` one. Keys found
//! on one side only are carried through; keys found on both sides are
//! settled by a [`MergeOptions`]: nested objects merge recursively, arrays
//! follow the [`ArrayConflictPolicy`], everything else follows the
//! [`KeyConflictPolicy`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use yaml_include_core::{MergeOptions, merge_values};
//!
//! let base = json!({"name": "base", "env": {"A": "1"}, "paths": ["/a"]});
//! let overlay = json!({"name": "app", "env": {"B": "2"}, "paths": ["/b"]});
//!
//! let merged = merge_values(&base, &overlay, &MergeOptions::default()).unwrap();
//! assert_eq!(
//!     merged,
//!     json!({"name": "app", "env": {"A": "1", "B": "2"}, "paths": ["/a", "/b"]})
//! );
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Resolution of a key present in both operands when the values cannot be
/// merged structurally.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use yaml_include_core::{KeyConflictPolicy, MergeOptions, merge_values};
///
/// let first = json!({"port": 80});
/// let second = json!({"port": 8080});
///
/// let keep = MergeOptions { key_policy: KeyConflictPolicy::ValueFromFirst, ..Default::default() };
/// assert_eq!(merge_values(&first, &second, &keep).unwrap()["port"], 80);
///
/// let replace = MergeOptions::default();
/// assert_eq!(merge_values(&first, &second, &replace).unwrap()["port"], 8080);
///
/// let strict = MergeOptions { key_policy: KeyConflictPolicy::Error, ..Default::default() };
/// assert!(merge_values(&first, &second, &strict).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyConflictPolicy {
    /// Keep the value from the first operand.
    ValueFromFirst,
    /// Take the value from the second operand (the default).
    #[default]
    ValueFromSecond,
    /// Fail with [`MergeConflict`] unless both values are equal.
    Error,
}

/// Resolution of a key whose value is an array in both operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayConflictPolicy {
    /// `first` elements followed by `second` elements (the default).
    /// Duplicates are kept.
    #[default]
    AppendSecondToFirst,
    /// `second` elements followed by `first` elements.
    AppendFirstToSecond,
    /// Keep the array from the first operand.
    ValueFromFirst,
    /// Take the array from the second operand.
    ValueFromSecond,
    /// Treat arrays like any other value and apply the [`KeyConflictPolicy`].
    UseKeyPolicy,
}

/// The policies applied by [`merge_values`].
///
/// The default is what include resolution uses: second operand wins,
/// arrays are concatenated, nested objects merge recursively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Policy for conflicting non-array values.
    pub key_policy: KeyConflictPolicy,
    /// Policy for keys holding arrays on both sides.
    pub array_policy: ArrayConflictPolicy,
    /// Merge objects found under the same key instead of applying the key
    /// policy to them.
    pub recursive: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            key_policy: KeyConflictPolicy::default(),
            array_policy: ArrayConflictPolicy::default(),
            recursive: true,
        }
    }
}

/// Two values clashed under [`KeyConflictPolicy::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("conflicting values at '{path}'")]
pub struct MergeConflict {
    /// Dotted key path of the conflict, `<root>` for the operands themselves.
    pub path: String,
}

impl MergeConflict {
    fn at(path: &[&str]) -> Self {
        let path = if path.is_empty() {
            "<root>".to_string()
        } else {
            path.join(".")
        };
        Self { path }
    }
}

/// Merges `second` onto `first` and returns the result as a new value.
///
/// Both operands are borrowed and left untouched. A `null` operand merged
/// with an object behaves like an empty object. Any other pair of
/// non-object operands is settled by the key policy.
///
/// # Errors
///
/// Returns [`MergeConflict`] only when `options.key_policy` is
/// [`KeyConflictPolicy::Error`] and two differing values meet.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use yaml_include_core::{MergeOptions, merge_values};
///
/// let options = MergeOptions::default();
/// let merged = merge_values(&json!(null), &json!({"a": 1}), &options).unwrap();
/// assert_eq!(merged, json!({"a": 1}));
///
/// // Non-objects degrade to "second overwrites first".
/// let merged = merge_values(&json!([1]), &json!("text"), &options).unwrap();
/// assert_eq!(merged, json!("text"));
/// ```
pub fn merge_values(
    first: &Value,
    second: &Value,
    options: &MergeOptions,
) -> Result<Value, MergeConflict> {
    match (first, second) {
        (Value::Object(first), Value::Object(second)) => {
            merge_objects(first, second, options, &mut Vec::new()).map(Value::Object)
        }
        (Value::Null, Value::Object(_)) => Ok(second.clone()),
        (Value::Object(_), Value::Null) => Ok(first.clone()),
        _ => apply_key_policy(first, second, options.key_policy, &[]),
    }
}

fn merge_objects<'a>(
    first: &'a Map<String, Value>,
    second: &'a Map<String, Value>,
    options: &MergeOptions,
    path: &mut Vec<&'a str>,
) -> Result<Map<String, Value>, MergeConflict> {
    let mut merged = Map::with_capacity(first.len() + second.len());

    for (key, existing) in first {
        let value = match second.get(key) {
            Some(incoming) => {
                path.push(key);
                let value = merge_entry(existing, incoming, options, path);
                path.pop();
                value?
            }
            None => existing.clone(),
        };
        merged.insert(key.clone(), value);
    }

    for (key, incoming) in second {
        if !first.contains_key(key) {
            merged.insert(key.clone(), incoming.clone());
        }
    }

    Ok(merged)
}

fn merge_entry<'a>(
    existing: &'a Value,
    incoming: &'a Value,
    options: &MergeOptions,
    path: &mut Vec<&'a str>,
) -> Result<Value, MergeConflict> {
    match (existing, incoming) {
        (Value::Object(first), Value::Object(second)) if options.recursive => {
            merge_objects(first, second, options, path).map(Value::Object)
        }
        (Value::Array(first), Value::Array(second)) => {
            merge_arrays(first, second, options, path)
        }
        _ => apply_key_policy(existing, incoming, options.key_policy, path),
    }
}

fn merge_arrays(
    first: &[Value],
    second: &[Value],
    options: &MergeOptions,
    path: &[&str],
) -> Result<Value, MergeConflict> {
    let merged = match options.array_policy {
        ArrayConflictPolicy::AppendSecondToFirst => first.iter().chain(second).cloned().collect(),
        ArrayConflictPolicy::AppendFirstToSecond => second.iter().chain(first).cloned().collect(),
        ArrayConflictPolicy::ValueFromFirst => first.to_vec(),
        ArrayConflictPolicy::ValueFromSecond => second.to_vec(),
        ArrayConflictPolicy::UseKeyPolicy => {
            return apply_key_policy(
                &Value::Array(first.to_vec()),
                &Value::Array(second.to_vec()),
                options.key_policy,
                path,
            );
        }
    };
    Ok(Value::Array(merged))
}

fn apply_key_policy(
    first: &Value,
    second: &Value,
    policy: KeyConflictPolicy,
    path: &[&str],
) -> Result<Value, MergeConflict> {
    match policy {
        KeyConflictPolicy::ValueFromFirst => Ok(first.clone()),
        KeyConflictPolicy::ValueFromSecond => Ok(second.clone()),
        KeyConflictPolicy::Error if first == second => Ok(first.clone()),
        KeyConflictPolicy::Error => Err(MergeConflict::at(path)),
    }
}
