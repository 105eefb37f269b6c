//! Core types for the state diff model.
//!
//! A state diff is built once by a caller that compared two snapshots of a
//! document, and is read (never mutated) by the update builder.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use docstate_path::ValidationError;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiffError {
    #[error("INVALID_FIELD: {path}: {source}")]
    InvalidField {
        path: String,
        #[source]
        source: ValidationError,
    },
    #[error("MALFORMED_DIFF: {path}: {reason}")]
    Malformed { path: String, reason: &'static str },
    #[error("INVALID_DIFF: {0}")]
    Decode(String),
}

// ── Values ────────────────────────────────────────────────────────────────

/// The change recorded for one field or one list slot.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    /// The field is removed.
    Absent,
    /// The field is replaced by this literal value. A JSON `null` counts as
    /// absence.
    Scalar(Value),
    /// Field-level changes inside a nested object.
    Diff(StateDiff),
    /// Changes to a list.
    List(ListDiff),
    /// An increment of a numeric counter.
    Delta(Delta),
}

impl StateValue {
    /// True for `Absent` and for a `null` scalar.
    pub fn is_absent(&self) -> bool {
        matches!(self, StateValue::Absent | StateValue::Scalar(Value::Null))
    }
}

impl From<Value> for StateValue {
    fn from(v: Value) -> Self {
        StateValue::Scalar(v)
    }
}

impl From<StateDiff> for StateValue {
    fn from(d: StateDiff) -> Self {
        StateValue::Diff(d)
    }
}

impl From<ListDiff> for StateValue {
    fn from(l: ListDiff) -> Self {
        StateValue::List(l)
    }
}

impl From<Delta> for StateValue {
    fn from(d: Delta) -> Self {
        StateValue::Delta(d)
    }
}

/// A counter change: the value seen in the snapshot and the amount added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub base: i64,
    pub inc: i64,
}

impl Delta {
    pub fn new(base: i64, inc: i64) -> Self {
        Self { base, inc }
    }

    /// The value after the increment, saturating at the `i64` bounds.
    pub fn full_value(&self) -> i64 {
        self.base.saturating_add(self.inc)
    }
}

// ── StateDiff ─────────────────────────────────────────────────────────────

/// Field-level changes to an object, keyed by field name.
///
/// Iteration follows insertion order so that compiling the same diff twice
/// produces the same output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiff {
    fields: IndexMap<String, StateValue>,
}

impl StateDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(n),
        }
    }

    /// Records a change, replacing any previous change for the same field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<StateValue>) -> Option<StateValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Chained form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&StateValue> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<StateValue>> FromIterator<(K, V)> for StateDiff {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut diff = StateDiff::new();
        for (k, v) in iter {
            diff.insert(k, v);
        }
        diff
    }
}

// ── ListDiff ──────────────────────────────────────────────────────────────

/// One slot of a positional list diff.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    /// The element at this index is unchanged.
    Nop,
    Value(StateValue),
}

impl From<StateValue> for ListEntry {
    fn from(v: StateValue) -> Self {
        ListEntry::Value(v)
    }
}

impl From<Value> for ListEntry {
    fn from(v: Value) -> Self {
        ListEntry::Value(StateValue::Scalar(v))
    }
}

impl From<StateDiff> for ListEntry {
    fn from(d: StateDiff) -> Self {
        ListEntry::Value(StateValue::Diff(d))
    }
}

impl From<ListDiff> for ListEntry {
    fn from(l: ListDiff) -> Self {
        ListEntry::Value(StateValue::List(l))
    }
}

/// Changes to a list: index-addressed edits, tail appends and by-value
/// removals. Any combination of the three may be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDiff {
    /// One entry per index, starting at 0.
    pub positional: Vec<ListEntry>,
    /// Brand-new elements added at the tail.
    pub append: Vec<StateValue>,
    /// Values removed wherever an equal element is found.
    pub remove: Vec<Value>,
}

impl ListDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(entries: Vec<ListEntry>) -> Self {
        Self {
            positional: entries,
            ..Self::default()
        }
    }

    pub fn append(values: Vec<StateValue>) -> Self {
        Self {
            append: values,
            ..Self::default()
        }
    }

    pub fn remove(values: Vec<Value>) -> Self {
        Self {
            remove: values,
            ..Self::default()
        }
    }

    pub fn with_positional(mut self, entries: Vec<ListEntry>) -> Self {
        self.positional = entries;
        self
    }

    pub fn with_append(mut self, values: Vec<StateValue>) -> Self {
        self.append = values;
        self
    }

    pub fn with_remove(mut self, values: Vec<Value>) -> Self {
        self.remove = values;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.append.is_empty() && self.remove.is_empty()
    }
}

// ── Flattening ────────────────────────────────────────────────────────────

/// Converts a change into the literal value it produces on a brand-new
/// element, where there is nothing to diff against.
///
/// `Ok(None)` means the value is absent. `path` is only used for errors.
pub fn to_literal(value: &StateValue, path: &str) -> Result<Option<Value>, DiffError> {
    match value {
        StateValue::Absent | StateValue::Scalar(Value::Null) => Ok(None),
        StateValue::Scalar(v) => Ok(Some(v.clone())),
        StateValue::Delta(d) => Ok(Some(Value::from(d.full_value()))),
        StateValue::Diff(diff) => {
            let mut obj = Map::with_capacity(diff.len());
            for (name, v) in diff.iter() {
                if let Some(lit) = to_literal(v, &child_path(path, name))? {
                    obj.insert(name.to_string(), lit);
                }
            }
            Ok(Some(Value::Object(obj)))
        }
        StateValue::List(list) => {
            if !list.remove.is_empty() {
                return Err(DiffError::Malformed {
                    path: path.to_string(),
                    reason: "removal inside a new element",
                });
            }
            let mut arr = Vec::with_capacity(list.positional.len() + list.append.len());
            for (i, entry) in list.positional.iter().enumerate() {
                match entry {
                    ListEntry::Nop => {
                        return Err(DiffError::Malformed {
                            path: child_path(path, &i.to_string()),
                            reason: "NOP inside a new element",
                        })
                    }
                    ListEntry::Value(v) => arr.push(element_literal(v, &child_path(path, &i.to_string()))?),
                }
            }
            for v in &list.append {
                let at = child_path(path, &arr.len().to_string());
                arr.push(element_literal(v, &at)?);
            }
            Ok(Some(Value::Array(arr)))
        }
    }
}

/// Literal form of a list element; an absent element becomes `null`.
pub fn element_literal(value: &StateValue, path: &str) -> Result<Value, DiffError> {
    Ok(to_literal(value, path)?.unwrap_or(Value::Null))
}

fn child_path(path: &str, step: &str) -> String {
    if path.is_empty() {
        step.to_string()
    } else {
        format!("{path}.{step}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_replaces_previous_change() {
        let mut diff = StateDiff::new();
        diff.insert("a", json!(1));
        let prev = diff.insert("a", json!(2));
        assert_eq!(prev, Some(StateValue::Scalar(json!(1))));
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn null_scalar_is_absent() {
        assert!(StateValue::Scalar(Value::Null).is_absent());
        assert!(StateValue::Absent.is_absent());
        assert!(!StateValue::Scalar(json!(0)).is_absent());
    }

    #[test]
    fn literal_of_nested_diff_drops_absent_fields() {
        let diff = StateDiff::new()
            .with("name", json!("a"))
            .with("gone", StateValue::Absent)
            .with("count", Delta::new(4, 1))
            .with("tags", ListDiff::positional(vec![json!("x").into()]).with_append(vec![json!("y").into()]));
        let lit = to_literal(&diff.into(), "files.0").unwrap();
        assert_eq!(lit, Some(json!({"name": "a", "count": 5, "tags": ["x", "y"]})));
    }

    #[test]
    fn literal_rejects_nop() {
        let list = ListDiff::positional(vec![ListEntry::Nop]);
        let err = to_literal(&list.into(), "files.3").unwrap_err();
        assert_eq!(
            err,
            DiffError::Malformed {
                path: "files.3.0".into(),
                reason: "NOP inside a new element"
            }
        );
    }

    #[test]
    fn literal_rejects_removal() {
        let list = ListDiff::remove(vec![json!(1)]);
        assert!(matches!(
            to_literal(&list.into(), "x"),
            Err(DiffError::Malformed { .. })
        ));
    }

    #[test]
    fn absent_list_element_becomes_null() {
        let list = ListDiff::append(vec![StateValue::Absent, json!(1).into()]);
        assert_eq!(to_literal(&list.into(), "l").unwrap(), Some(json!([null, 1])));
    }

    #[test]
    fn delta_full_value_saturates() {
        assert_eq!(Delta::new(i64::MAX, 1).full_value(), i64::MAX);
        assert_eq!(Delta::new(10, -3).full_value(), 7);
    }
}
