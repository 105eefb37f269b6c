//! Compiles a [`StateDiff`] into update groups and list guard conditions.
//!
//! The walk is a single recursive descent over the diff. Plain nested object
//! changes flatten into dotted paths of one group. Lists edited by index
//! record their path as a condition, and tail appends or by-value removals
//! are placed by the [`GroupingPolicy`] so that no group mixes operators the
//! store cannot apply together on one list.

use std::collections::BTreeSet;

use docstate_path::{validate_field_name, PathAccumulator};
use serde_json::Value;

use super::grouping::{ArrayOperatorPolicy, GroupingPolicy, Partitioner};
use super::types::{CompiledUpdate, ConditionSet, Guard, UpdateOp};
use crate::state_diff::{element_literal, DiffError, ListDiff, ListEntry, StateDiff, StateValue};

// ── Public API ────────────────────────────────────────────────────────────

/// Compile a diff for a path-addressed document store.
///
/// Uses [`ArrayOperatorPolicy`]: an index-addressed edit, an append and a
/// by-value removal on the same list land in separate groups.
pub fn build(diff: &StateDiff) -> Result<CompiledUpdate, DiffError> {
    build_with(diff, &ArrayOperatorPolicy)
}

/// Compile a diff, splitting groups according to `policy`.
///
/// Fails without producing any group if the diff is malformed.
pub fn build_with(diff: &StateDiff, policy: &dyn GroupingPolicy) -> Result<CompiledUpdate, DiffError> {
    let mut builder = UpdateBuilder::new(policy);
    builder.state_diff(diff, &PathAccumulator::new())?;
    let compiled = builder.finish();
    tracing::debug!(
        groups = compiled.groups.len(),
        ops = compiled.op_count(),
        conditions = compiled.conditions.len(),
        "compiled state diff"
    );
    Ok(compiled)
}

// ── Builder ───────────────────────────────────────────────────────────────

struct UpdateBuilder<'p> {
    partitioner: Partitioner<'p>,
    conditions: ConditionSet,
    /// Groups holding an operation beneath each condition path, indexed like
    /// `conditions`.
    guard_groups: Vec<BTreeSet<usize>>,
}

impl<'p> UpdateBuilder<'p> {
    fn new(policy: &'p dyn GroupingPolicy) -> Self {
        Self {
            partitioner: Partitioner::new(policy),
            conditions: ConditionSet::default(),
            guard_groups: Vec::new(),
        }
    }

    fn state_diff(&mut self, diff: &StateDiff, at: &PathAccumulator) -> Result<(), DiffError> {
        for (name, value) in diff.iter() {
            let child = at.field(name);
            validate_field_name(name).map_err(|source| DiffError::InvalidField {
                path: child.render().to_string(),
                source,
            })?;
            self.value(value, &child)?;
        }
        Ok(())
    }

    fn value(&mut self, value: &StateValue, at: &PathAccumulator) -> Result<(), DiffError> {
        match value {
            StateValue::Absent | StateValue::Scalar(Value::Null) => self.emit(at, UpdateOp::Unset),
            StateValue::Scalar(v) => self.emit(at, UpdateOp::Set(v.clone())),
            StateValue::Delta(d) => self.emit(at, UpdateOp::Inc(d.inc)),
            StateValue::Diff(diff) => self.state_diff(diff, at)?,
            StateValue::List(list) => self.list_diff(list, at)?,
        }
        Ok(())
    }

    fn list_diff(&mut self, list: &ListDiff, at: &PathAccumulator) -> Result<(), DiffError> {
        if !list.positional.is_empty() {
            let (idx, _) = self.conditions.insert(at.render());
            if idx == self.guard_groups.len() {
                self.guard_groups.push(BTreeSet::new());
            }
            let elements = at.enter_list();
            for (i, entry) in list.positional.iter().enumerate() {
                // a NOP still takes its index
                if let ListEntry::Value(v) = entry {
                    self.value(v, &elements.index(i))?;
                }
            }
        }
        if !list.append.is_empty() {
            let values = list
                .append
                .iter()
                .map(|v| element_literal(v, at.render()))
                .collect::<Result<Vec<_>, _>>()?;
            self.emit(at, UpdateOp::Push(values));
        }
        if !list.remove.is_empty() {
            self.emit(at, UpdateOp::Pull(list.remove.clone()));
        }
        Ok(())
    }

    fn emit(&mut self, at: &PathAccumulator, op: UpdateOp) {
        let group = self.partitioner.place(at.render(), op);
        for boundary in at.boundaries() {
            if let Some(i) = self.conditions.index_of(boundary) {
                self.guard_groups[i].insert(group);
            }
        }
    }

    fn finish(self) -> CompiledUpdate {
        let mut groups = self.partitioner.into_groups();
        if !groups.is_empty() {
            for (path, under) in self.conditions.iter().zip(&self.guard_groups) {
                let mut under = under.iter().copied();
                let first = under.next().unwrap_or(0);
                groups[first].guards.insert(path.to_string(), Guard::Snapshot);
                // earlier groups may already have rewritten its elements
                for later in under {
                    groups[later].guards.insert(path.to_string(), Guard::Length);
                }
            }
        }
        groups.retain(|g| !g.is_empty());
        CompiledUpdate {
            groups,
            conditions: self.conditions,
        }
    }
}
