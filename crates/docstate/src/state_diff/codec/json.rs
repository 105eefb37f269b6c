//! JSON codec for state diffs.
//!
//! A JSON object decodes to a [`StateDiff`]. An object with a single
//! `$`-prefixed key is a tagged value instead:
//!
//! | JSON                                              | Value                    |
//! |---------------------------------------------------|--------------------------|
//! | `{"$unset": true}`                                | [`StateValue::Absent`]   |
//! | `{"$literal": v}`                                 | `v` set verbatim         |
//! | `{"$delta": {"base": 3, "inc": 1}}`               | [`StateValue::Delta`]    |
//! | `{"$list": {"diff": [..], "push": [..], "pull": [..]}}` | [`StateValue::List`] |
//! | `{"$nop": true}` (inside `diff` only)             | [`ListEntry::Nop`]       |
//!
//! Every other JSON value is a scalar set verbatim.

use serde_json::{json, Map, Value};

use crate::state_diff::types::{Delta, DiffError, ListDiff, ListEntry, StateDiff, StateValue};

pub const TAG_UNSET: &str = "$unset";
pub const TAG_LITERAL: &str = "$literal";
pub const TAG_DELTA: &str = "$delta";
pub const TAG_LIST: &str = "$list";
pub const TAG_NOP: &str = "$nop";

// ── Deserialization ───────────────────────────────────────────────────────

/// Decode a state diff from its JSON form.
pub fn from_json(v: &Value) -> Result<StateDiff, DiffError> {
    let obj = v
        .as_object()
        .ok_or_else(|| DiffError::Decode("state diff must be an object".into()))?;
    decode_diff(obj)
}

/// Parse and decode a state diff from JSON text.
pub fn from_json_str(s: &str) -> Result<StateDiff, DiffError> {
    let v: Value = serde_json::from_str(s).map_err(|e| DiffError::Decode(e.to_string()))?;
    from_json(&v)
}

fn decode_diff(obj: &Map<String, Value>) -> Result<StateDiff, DiffError> {
    let mut diff = StateDiff::with_capacity(obj.len());
    for (name, v) in obj {
        diff.insert(name.clone(), decode_value(v)?);
    }
    Ok(diff)
}

fn tag(obj: &Map<String, Value>) -> Option<(&str, &Value)> {
    if obj.len() != 1 {
        return None;
    }
    obj.iter()
        .next()
        .filter(|(k, _)| k.starts_with('$'))
        .map(|(k, v)| (k.as_str(), v))
}

fn decode_value(v: &Value) -> Result<StateValue, DiffError> {
    let obj = match v {
        Value::Object(obj) => obj,
        other => return Ok(StateValue::Scalar(other.clone())),
    };
    let Some((key, inner)) = tag(obj) else {
        return Ok(StateValue::Diff(decode_diff(obj)?));
    };
    match key {
        TAG_UNSET => Ok(StateValue::Absent),
        TAG_LITERAL => Ok(StateValue::Scalar(inner.clone())),
        TAG_DELTA => decode_delta(inner).map(StateValue::Delta),
        TAG_LIST => decode_list(inner).map(StateValue::List),
        TAG_NOP => Err(DiffError::Decode("$nop outside a positional list".into())),
        other => Err(DiffError::Decode(format!("unknown tag: {other}"))),
    }
}

fn decode_entry(v: &Value) -> Result<ListEntry, DiffError> {
    if let Some(obj) = v.as_object() {
        if let Some((TAG_NOP, _)) = tag(obj) {
            return Ok(ListEntry::Nop);
        }
    }
    decode_value(v).map(ListEntry::Value)
}

fn decode_delta(v: &Value) -> Result<Delta, DiffError> {
    let field = |name: &str| {
        v.get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| DiffError::Decode(format!("$delta.{name} must be an integer")))
    };
    Ok(Delta::new(field("base")?, field("inc")?))
}

fn decode_array<'a>(v: &'a Value, name: &str) -> Result<&'a Vec<Value>, DiffError> {
    v.as_array()
        .ok_or_else(|| DiffError::Decode(format!("$list.{name} must be an array")))
}

fn decode_list(v: &Value) -> Result<ListDiff, DiffError> {
    let obj = v
        .as_object()
        .ok_or_else(|| DiffError::Decode("$list must be an object".into()))?;
    let mut list = ListDiff::new();
    for (key, part) in obj {
        match key.as_str() {
            "diff" => {
                list.positional = decode_array(part, "diff")?
                    .iter()
                    .map(decode_entry)
                    .collect::<Result<_, _>>()?;
            }
            "push" => {
                list.append = decode_array(part, "push")?
                    .iter()
                    .map(decode_value)
                    .collect::<Result<_, _>>()?;
            }
            "pull" => list.remove = decode_array(part, "pull")?.clone(),
            other => return Err(DiffError::Decode(format!("unknown $list key: {other}"))),
        }
    }
    Ok(list)
}

// ── Serialization ─────────────────────────────────────────────────────────

/// Serialize a state diff to its JSON form.
pub fn to_json(diff: &StateDiff) -> Value {
    let mut obj = Map::with_capacity(diff.len());
    for (name, v) in diff.iter() {
        obj.insert(name.to_string(), encode_value(v));
    }
    Value::Object(obj)
}

fn encode_value(v: &StateValue) -> Value {
    match v {
        StateValue::Absent => json!({ TAG_UNSET: true }),
        StateValue::Scalar(Value::Object(obj)) => json!({ TAG_LITERAL: obj }),
        StateValue::Scalar(other) => other.clone(),
        StateValue::Diff(diff) => to_json(diff),
        StateValue::Delta(d) => json!({ TAG_DELTA: { "base": d.base, "inc": d.inc } }),
        StateValue::List(list) => {
            let mut m = Map::new();
            if !list.positional.is_empty() {
                m.insert(
                    "diff".into(),
                    Value::Array(list.positional.iter().map(encode_entry).collect()),
                );
            }
            if !list.append.is_empty() {
                m.insert(
                    "push".into(),
                    Value::Array(list.append.iter().map(encode_value).collect()),
                );
            }
            if !list.remove.is_empty() {
                m.insert("pull".into(), Value::Array(list.remove.clone()));
            }
            json!({ TAG_LIST: m })
        }
    }
}

fn encode_entry(e: &ListEntry) -> Value {
    match e {
        ListEntry::Nop => json!({ TAG_NOP: true }),
        ListEntry::Value(v) => encode_value(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_nested_diff() {
        let diff = from_json(&json!({
            "title": "t",
            "meta": {"author": {"$unset": true}, "views": {"$delta": {"base": 3, "inc": 2}}}
        }))
        .unwrap();

        assert_eq!(diff.get("title"), Some(&StateValue::Scalar(json!("t"))));
        let Some(StateValue::Diff(meta)) = diff.get("meta") else {
            panic!("meta must decode as a nested diff");
        };
        assert_eq!(meta.get("author"), Some(&StateValue::Absent));
        assert_eq!(meta.get("views"), Some(&StateValue::Delta(Delta::new(3, 2))));
    }

    #[test]
    fn decode_list_parts() {
        let diff = from_json(&json!({
            "tags": {"$list": {"diff": [{"$nop": true}, "b"], "push": ["c"], "pull": ["a"]}}
        }))
        .unwrap();
        let Some(StateValue::List(list)) = diff.get("tags") else {
            panic!("tags must decode as a list diff");
        };
        assert_eq!(list.positional, vec![ListEntry::Nop, json!("b").into()]);
        assert_eq!(list.append, vec![StateValue::Scalar(json!("c"))]);
        assert_eq!(list.remove, vec![json!("a")]);
    }

    #[test]
    fn decode_literal_object() {
        let diff = from_json(&json!({"blob": {"$literal": {"a": 1}}})).unwrap();
        assert_eq!(diff.get("blob"), Some(&StateValue::Scalar(json!({"a": 1}))));
    }

    #[test]
    fn decode_rejects_nop_outside_list() {
        let err = from_json(&json!({"a": {"$nop": true}})).unwrap_err();
        assert!(matches!(err, DiffError::Decode(_)));
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        assert!(from_json(&json!({"a": {"$push": 1}})).is_err());
        assert!(from_json(&json!({"a": {"$list": {"splice": []}}})).is_err());
        assert!(from_json(&json!({"a": {"$delta": {"base": 1.5, "inc": 1}}})).is_err());
        assert!(from_json(&json!([1])).is_err());
    }

    #[test]
    fn encode_then_decode_preserves_diff() {
        let src = json!({
            "a": {"$unset": true},
            "b": {"$literal": {"x": 1}},
            "c": [1, 2],
            "d": {"$list": {"diff": [{"$nop": true}, {"k": "v"}], "push": [{"n": 1}]}},
            "e": {"$delta": {"base": 0, "inc": 5}}
        });
        let diff = from_json(&src).unwrap();
        assert_eq!(to_json(&diff), src);
    }
}
