//! Structured value parsing, serialization, and typed views.
//!
//! Documents are parsed from YAML (or JSON, which YAML accepts) into a
//! [`serde_json::Value`] tree: objects, arrays, scalars, and null. The YAML
//! data model is wider than that tree, so parsing normalizes it:
//!
//! - non-string mapping keys (`1: a`, `true: b`) become their string form
//! - YAML tags are dropped and the tagged value is kept
//! - non-finite floats (`.nan`, `.inf`) become `null`
//!
//! Keys that only become equal after this conversion (`1` and `"1"`) are
//! rejected like any other duplicate key.
//!
//! # Example
//!
//! ```
//! use yaml_include_core::{parse_text, to_yaml_string};
//!
//! let value = parse_text("name: app\nports: [80, 443]\n").unwrap();
//! assert_eq!(value["name"], "app");
//! assert_eq!(value["ports"][1], 443);
//!
//! let yaml = to_yaml_string(&value).unwrap();
//! assert_eq!(parse_text(&yaml).unwrap(), value);
//! ```

use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;
use thiserror::Error;

/// Malformed structured text.
///
/// Carries the parser message, the failure location when the parser reports
/// one, and the complete offending text so callers can render diagnostics
/// with [`snippet`](ParseError::snippet).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
    line: Option<usize>,
    column: Option<usize>,
    source_text: String,
}

impl ParseError {
    /// Creates a parse error without location information.
    pub fn new(message: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            source_text: source_text.into(),
        }
    }

    fn from_yaml(err: &serde_yaml::Error, source_text: &str) -> Self {
        let location = err.location();
        Self {
            message: err.to_string(),
            line: location.as_ref().map(|loc| loc.line()),
            column: location.as_ref().map(|loc| loc.column()),
            source_text: source_text.to_string(),
        }
    }

    /// Parser message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line of the failure, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// 1-based column of the failure, if known.
    pub fn column(&self) -> Option<usize> {
        self.column
    }

    /// The text that failed to parse.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Renders numbered source lines around the failure.
    ///
    /// Shows `context` lines on each side of the offending line, which is
    /// marked with `>`. When the location is unknown, every line is shown.
    ///
    /// # Examples
    ///
    /// ```
    /// use yaml_include_core::parse_text;
    ///
    /// let err = parse_text("a: 1\nb: [2, 3\nc: 4\n").unwrap_err();
    /// let snippet = err.snippet(1);
    /// assert!(snippet.contains(" | b: [2, 3"));
    /// ```
    pub fn snippet(&self, context: usize) -> String {
        let lines: Vec<&str> = self.source_text.lines().collect();
        if lines.is_empty() {
            return String::new();
        }

        let (first, last) = match self.line {
            Some(line) => {
                let line = line.clamp(1, lines.len());
                (
                    line.saturating_sub(context).max(1),
                    line.saturating_add(context).min(lines.len()),
                )
            }
            None => (1, lines.len()),
        };
        let width = last.to_string().len();

        let mut out = String::new();
        for number in first..=last {
            let marker = if Some(number) == self.line { '>' } else { ' ' };
            let _ = writeln!(out, "{marker} {number:>width$} | {}", lines[number - 1]);
        }
        out
    }
}

/// Parses YAML or JSON text into a structured value.
///
/// Empty input parses to [`Value::Null`]. Streams with more than one YAML
/// document are rejected.
///
/// # Errors
///
/// Returns [`ParseError`] on malformed syntax, duplicate mapping keys, or
/// multi-document input.
///
/// # Examples
///
/// ```
/// use yaml_include_core::parse_text;
///
/// let value = parse_text("{\"a\": {\"b\": true}}").unwrap();
/// assert_eq!(value["a"]["b"], true);
///
/// assert!(parse_text("").unwrap().is_null());
/// assert!(parse_text("a: [1, 2").is_err());
/// ```
pub fn parse_text(text: &str) -> Result<Value, ParseError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let yaml: YamlValue =
        serde_yaml::from_str(text).map_err(|err| ParseError::from_yaml(&err, text))?;
    from_yaml(yaml).map_err(|message| ParseError::new(message, text))
}

/// Parses structured text straight into a typed value.
///
/// # Errors
///
/// Returns [`ParseError`] if the text is malformed or its shape does not
/// match `T`.
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
/// use yaml_include_core::parse_text_as;
///
/// #[derive(Deserialize)]
/// struct Service {
///     name: String,
///     replicas: u32,
/// }
///
/// let svc: Service = parse_text_as("name: api\nreplicas: 3\n").unwrap();
/// assert_eq!(svc.name, "api");
/// assert_eq!(svc.replicas, 3);
/// ```
pub fn parse_text_as<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let value = parse_text(text)?;
    serde_json::from_value(value).map_err(|err| ParseError::new(err.to_string(), text))
}

/// Serializes a structured value as YAML.
pub fn to_yaml_string(value: &Value) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}

/// Serializes a structured value as pretty-printed JSON.
pub fn to_json_string(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Views a value as a list of strings.
///
/// Returns `None` unless `value` is an array whose elements are all strings.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use yaml_include_core::string_list;
///
/// assert_eq!(
///     string_list(&json!(["a.yaml", "b.yaml"])),
///     Some(vec!["a.yaml".to_string(), "b.yaml".to_string()])
/// );
/// assert_eq!(string_list(&json!("a.yaml")), None);
/// assert_eq!(string_list(&json!(["a.yaml", 1])), None);
/// ```
pub fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect()
}

/// Converts a YAML tree, failing when two keys of one mapping collapse to
/// the same string.
fn from_yaml(value: YamlValue) -> Result<Value, String> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => from_yaml_number(&n),
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<_, _>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = key_string(key)?;
                let value = from_yaml(value)?;
                if object.contains_key(&key) {
                    return Err(format!("duplicate mapping key '{key}' after key conversion"));
                }
                object.insert(key, value);
            }
            Value::Object(object)
        }
        YamlValue::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}

fn from_yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number)
    }
}

fn key_string(key: YamlValue) -> Result<String, String> {
    Ok(match key {
        YamlValue::String(s) => s,
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Tagged(tagged) => key_string(tagged.value)?,
        complex @ (YamlValue::Sequence(_) | YamlValue::Mapping(_)) => {
            serde_json::to_string(&from_yaml(complex)?).map_err(|err| err.to_string())?
        }
    })
}
