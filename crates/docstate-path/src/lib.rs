//! Dot-joined document paths.
//!
//! A document path addresses a value inside a nested document made of
//! objects and lists. Field steps and list index steps are joined with `.`,
//! and indices are rendered as bare non-negative integers, so
//! `files.0.name` is the `name` field of the first element of `files`.
//!
//! # Example
//!
//! ```
//! use docstate_path::{format_path, get, parse_path, PathStep};
//!
//! // Parse a rendered path into steps
//! let path = parse_path("files.0.name");
//! assert_eq!(path, vec![PathStep::from("files"), PathStep::Index(0), PathStep::from("name")]);
//!
//! // Render steps back into a path string
//! assert_eq!(format_path(&path), "files.0.name");
//!
//! // Read a value from a JSON document
//! let doc = serde_json::json!({"files": [{"name": "a.txt"}]});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!("a.txt")));
//! ```

use serde_json::Value;

pub mod types;
pub use types::{Path, PathStep};

pub mod validate;
pub use validate::{validate_field_name, ValidationError};

pub mod accumulator;
pub use accumulator::PathAccumulator;

/// Parse a rendered path into steps.
///
/// Segments written as canonical non-negative integers (`0`, `17`, never
/// `007`) are list indices; everything else is a field name. The empty string
/// is the root path.
///
/// # Example
///
/// ```
/// use docstate_path::{parse_path, PathStep};
///
/// assert_eq!(parse_path(""), Vec::<PathStep>::new());
/// assert_eq!(parse_path("a.2"), vec![PathStep::from("a"), PathStep::Index(2)]);
/// ```
pub fn parse_path(rendered: &str) -> Path {
    if rendered.is_empty() {
        return Vec::new();
    }
    rendered.split('.').map(parse_step).collect()
}

fn parse_step(segment: &str) -> PathStep {
    if is_integer(segment) && (segment == "0" || !segment.starts_with('0')) {
        if let Ok(i) = segment.parse::<usize>() {
            return PathStep::Index(i);
        }
    }
    PathStep::Field(segment.to_string())
}

/// Format path steps into a rendered path.
///
/// Returns an empty string for the root path.
///
/// # Example
///
/// ```
/// use docstate_path::{format_path, PathStep};
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&[PathStep::from("array"), PathStep::Index(0), PathStep::from("key")]), "array.0.key");
/// ```
pub fn format_path(path: &[PathStep]) -> String {
    let mut out = String::new();
    for (i, step) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match step {
            PathStep::Field(name) => out.push_str(name),
            PathStep::Index(idx) => out.push_str(&idx.to_string()),
        }
    }
    out
}

/// Check if a string consists only of ASCII digits.
pub fn is_integer(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Proper prefixes of a rendered path, shortest first.
///
/// # Example
///
/// ```
/// use docstate_path::rendered_prefixes;
///
/// let prefixes: Vec<&str> = rendered_prefixes("foo.0.bar").collect();
/// assert_eq!(prefixes, vec!["foo", "foo.0"]);
/// ```
pub fn rendered_prefixes(rendered: &str) -> impl Iterator<Item = &str> + '_ {
    rendered
        .match_indices('.')
        .map(move |(i, _)| &rendered[..i])
}

/// Get a value from a JSON document by path.
///
/// Steps resolve by container type, the way a dot-path store reads them: an
/// index step on an object looks up the field spelled with those digits.
/// Returns `None` if the path doesn't exist: a missing field, an out of range
/// index, or a field step on a list.
///
/// # Example
///
/// ```
/// use docstate_path::{get, parse_path};
/// use serde_json::json;
///
/// let doc = json!({"a": [{"b": 1}]});
/// assert_eq!(get(&doc, &parse_path("a.0.b")), Some(&json!(1)));
/// assert_eq!(get(&doc, &parse_path("a.1.b")), None);
/// ```
pub fn get<'a>(val: &'a Value, path: &[PathStep]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        current = match (current, step) {
            (Value::Array(arr), PathStep::Index(i)) => arr.get(*i)?,
            (Value::Object(map), PathStep::Field(name)) => map.get(name)?,
            (Value::Object(map), PathStep::Index(i)) => map.get(&i.to_string())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a value by rendered path.
pub fn get_rendered<'a>(val: &'a Value, rendered: &str) -> Option<&'a Value> {
    get(val, &parse_path(rendered))
}
