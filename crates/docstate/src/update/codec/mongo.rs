//! Operator-document codec for path-addressed document stores.
//!
//! Each [`UpdateGroup`] becomes one update document keyed by operator
//! (`$set`, `$unset`, `$inc`, `$push`, `$pullAll`) plus a filter that pins the
//! document id and every guarded list to its snapshot value or length.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use docstate_path::get_rendered;

use crate::update::types::{CompiledUpdate, Guard, OpKind, UpdateGroup, UpdateOp};

pub const OP_SET: &str = "$set";
pub const OP_UNSET: &str = "$unset";
pub const OP_INC: &str = "$inc";
pub const OP_PUSH: &str = "$push";
pub const OP_EACH: &str = "$each";
pub const OP_PULL_ALL: &str = "$pullAll";
pub const OP_SIZE: &str = "$size";

pub const DEFAULT_ID_KEY: &str = "_id";

/// Rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Key the document id is stored under.
    pub id_key: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            id_key: DEFAULT_ID_KEY.to_string(),
        }
    }
}

/// Extra condition and update carried by every statement of one diff, used
/// to detect any concurrent write to the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeToken {
    pub conditions: Map<String, Value>,
    pub updates: Map<String, Value>,
}

/// One store statement: update the document matching `filter` with `update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub filter: Map<String, Value>,
    pub update: Map<String, Value>,
}

pub fn operator(kind: OpKind) -> &'static str {
    match kind {
        OpKind::Set => OP_SET,
        OpKind::Unset => OP_UNSET,
        OpKind::Inc => OP_INC,
        OpKind::Push => OP_PUSH,
        OpKind::Pull => OP_PULL_ALL,
    }
}

fn operand(op: &UpdateOp) -> Value {
    match op {
        UpdateOp::Set(v) => v.clone(),
        UpdateOp::Unset => json!(1),
        UpdateOp::Inc(n) => json!(n),
        // no need for $each with a single element
        UpdateOp::Push(values) if values.len() == 1 => values[0].clone(),
        UpdateOp::Push(values) => json!({ OP_EACH: values }),
        UpdateOp::Pull(values) => Value::Array(values.clone()),
    }
}

/// Render a group as an operator-keyed update document.
pub fn group_to_document(group: &UpdateGroup) -> Map<String, Value> {
    let mut doc = Map::new();
    for (path, op) in group.iter() {
        let entry = doc
            .entry(operator(op.kind()))
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(fields) = entry {
            fields.insert(path.to_string(), operand(op));
        }
    }
    doc
}

/// Clauses pinning each guarded list of `group` to its value in `snapshot`,
/// or to its length for a [`Guard::Length`]. A list missing from the
/// snapshot is pinned to `null`, which also matches an absent field.
pub fn guard_filter(group: &UpdateGroup, snapshot: &Value) -> Map<String, Value> {
    group
        .guards()
        .map(|(path, guard)| {
            let current = get_rendered(snapshot, path);
            let expected = match (guard, current) {
                (_, None) => Value::Null,
                (Guard::Snapshot, Some(v)) => v.clone(),
                (Guard::Length, Some(Value::Array(items))) => json!({ OP_SIZE: items.len() }),
                (Guard::Length, Some(v)) => v.clone(),
            };
            (path.to_string(), expected)
        })
        .collect()
}

/// Render every group of a compiled diff as a statement on document `id`.
///
/// `snapshot` is the document as read before the diff was computed.
pub fn to_statements(
    id: &Value,
    compiled: &CompiledUpdate,
    snapshot: &Value,
    token: Option<&ChangeToken>,
    options: &RenderOptions,
) -> Vec<Statement> {
    compiled
        .groups
        .iter()
        .map(|group| {
            let mut filter = Map::new();
            filter.insert(options.id_key.clone(), id.clone());
            filter.extend(guard_filter(group, snapshot));
            let mut update = group_to_document(group);
            if let Some(token) = token {
                filter.extend(token.conditions.clone());
                let set = update
                    .entry(OP_SET)
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(fields) = set {
                    fields.extend(token.updates.clone());
                }
            }
            tracing::trace!(?filter, ?update, "update statement");
            Statement { filter, update }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_diff::{ListDiff, StateDiff};
    use crate::update::build;

    #[test]
    fn render_set_unset_inc() {
        let diff = StateDiff::new()
            .with("a", json!("x"))
            .with("b", crate::state_diff::StateValue::Absent)
            .with("c", crate::state_diff::Delta::new(1, 3));
        let compiled = build(&diff).unwrap();
        let doc = group_to_document(&compiled.groups[0]);
        assert_eq!(
            Value::Object(doc),
            json!({"$set": {"a": "x"}, "$unset": {"b": 1}, "$inc": {"c": 3}})
        );
    }

    #[test]
    fn render_push_single_and_each() {
        let diff = StateDiff::new()
            .with("one", ListDiff::append(vec![json!(1).into()]))
            .with("many", ListDiff::append(vec![json!(1).into(), json!(2).into()]));
        let compiled = build(&diff).unwrap();
        let doc = group_to_document(&compiled.groups[0]);
        assert_eq!(
            Value::Object(doc),
            json!({"$push": {"one": 1, "many": {"$each": [1, 2]}}})
        );
    }

    #[test]
    fn render_pull_all() {
        let diff = StateDiff::new().with("tags", ListDiff::remove(vec![json!("a")]));
        let compiled = build(&diff).unwrap();
        assert_eq!(
            Value::Object(group_to_document(&compiled.groups[0])),
            json!({"$pullAll": {"tags": ["a"]}})
        );
    }

    #[test]
    fn length_guard_renders_size() {
        let tags = ListDiff::positional(vec![json!("A").into()]).with_append(vec![json!("y").into()]);
        let outer = ListDiff::positional(vec![StateDiff::new().with("tags", tags).into()]);
        let compiled = build(&StateDiff::new().with("p", outer)).unwrap();
        let snapshot = json!({"p": [{"tags": ["a"]}, {"tags": []}]});

        assert_eq!(
            Value::Object(guard_filter(&compiled.groups[1], &snapshot)),
            json!({"p": {"$size": 2}})
        );
        assert_eq!(
            Value::Object(guard_filter(&compiled.groups[1], &json!({}))),
            json!({"p": null})
        );
    }

    #[test]
    fn default_options_use_underscore_id() {
        assert_eq!(RenderOptions::default().id_key, "_id");
    }
}
