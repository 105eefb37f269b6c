//! Splitting compiled operations into atomically-applicable groups.
//!
//! A path-addressed document store cannot update `list.0.key` and `list`
//! (append, by-value removal) in one statement: one path is a prefix of the
//! other. A [`GroupingPolicy`] says which operation kinds may still share a
//! statement when their paths overlap; the [`Partitioner`] applies it while
//! operations are compiled.

use std::collections::HashMap;

use docstate_path::rendered_prefixes;

use super::types::{OpKind, OpKinds, UpdateGroup, UpdateOp};

/// Decides whether two operations on overlapping paths may share a group.
///
/// Two paths overlap when one equals or is an ancestor of the other.
/// Operations on the identical path never share a group, whatever the policy
/// says, since a group holds one operation per path.
pub trait GroupingPolicy {
    fn can_share(&self, existing: OpKind, incoming: OpKind) -> bool;
}

impl<F> GroupingPolicy for F
where
    F: Fn(OpKind, OpKind) -> bool,
{
    fn can_share(&self, existing: OpKind, incoming: OpKind) -> bool {
        self(existing, incoming)
    }
}

/// Document-store semantics: overlapping paths always go to separate
/// statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayOperatorPolicy;

impl GroupingPolicy for ArrayOperatorPolicy {
    fn can_share(&self, _existing: OpKind, _incoming: OpKind) -> bool {
        false
    }
}

/// For stores that apply any mix of operators in one statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleStatementPolicy;

impl GroupingPolicy for SingleStatementPolicy {
    fn can_share(&self, _existing: OpKind, _incoming: OpKind) -> bool {
        true
    }
}

// ── Partitioner ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Slot {
    group: UpdateGroup,
    /// Kinds of the operations beneath each proper prefix of a path in
    /// `group`.
    below: HashMap<String, OpKinds>,
}

impl Slot {
    fn conflicts(&self, path: &str, kind: OpKind, policy: &dyn GroupingPolicy) -> bool {
        if self.group.ops.contains_key(path) {
            return true;
        }
        for prefix in rendered_prefixes(path) {
            if let Some(op) = self.group.ops.get(prefix) {
                if !policy.can_share(op.kind(), kind) {
                    return true;
                }
            }
        }
        match self.below.get(path) {
            Some(kinds) => kinds.iter().any(|k| !policy.can_share(k, kind)),
            None => false,
        }
    }

    fn add(&mut self, path: &str, op: UpdateOp) {
        let kind = op.kind();
        for prefix in rendered_prefixes(path) {
            match self.below.get_mut(prefix) {
                Some(kinds) => kinds.insert(kind),
                None => {
                    let mut kinds = OpKinds::default();
                    kinds.insert(kind);
                    self.below.insert(prefix.to_string(), kinds);
                }
            }
        }
        self.group.ops.insert(path.to_string(), op);
    }
}

/// Places operations into groups under a policy.
///
/// An operation goes into the earliest group after the last group holding a
/// conflicting operation, so operations on overlapping paths keep their
/// compile order across groups.
pub struct Partitioner<'p> {
    policy: &'p dyn GroupingPolicy,
    slots: Vec<Slot>,
}

impl<'p> Partitioner<'p> {
    pub fn new(policy: &'p dyn GroupingPolicy) -> Self {
        Self {
            policy,
            slots: Vec::new(),
        }
    }

    /// Adds an operation and returns the index of the group it landed in.
    pub fn place(&mut self, path: &str, op: UpdateOp) -> usize {
        let kind = op.kind();
        let target = self
            .slots
            .iter()
            .rposition(|slot| slot.conflicts(path, kind, self.policy))
            .map_or(0, |i| i + 1);
        if target == self.slots.len() {
            if target > 0 {
                tracing::trace!(path, kind = kind.as_str(), group = target, "opening update group on conflict");
            }
            self.slots.push(Slot::default());
        }
        self.slots[target].add(path, op);
        target
    }

    pub fn group_count(&self) -> usize {
        self.slots.len()
    }

    pub fn into_groups(self) -> Vec<UpdateGroup> {
        self.slots.into_iter().map(|slot| slot.group).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(v: i64) -> UpdateOp {
        UpdateOp::Set(json!(v))
    }

    #[test]
    fn disjoint_paths_share_one_group() {
        let mut p = Partitioner::new(&ArrayOperatorPolicy);
        assert_eq!(p.place("a.b", set(1)), 0);
        assert_eq!(p.place("a.c", set(2)), 0);
        assert_eq!(p.place("ab", set(3)), 0);
        assert_eq!(p.group_count(), 1);
    }

    #[test]
    fn parent_after_child_opens_group() {
        let mut p = Partitioner::new(&ArrayOperatorPolicy);
        assert_eq!(p.place("list.0", set(1)), 0);
        assert_eq!(p.place("list", UpdateOp::Push(vec![json!(2)])), 1);
    }

    #[test]
    fn child_after_parent_opens_group() {
        let mut p = Partitioner::new(&ArrayOperatorPolicy);
        assert_eq!(p.place("list", UpdateOp::Push(vec![json!(2)])), 0);
        assert_eq!(p.place("list.0.key", set(1)), 1);
    }

    #[test]
    fn same_path_always_splits() {
        let mut p = Partitioner::new(&SingleStatementPolicy);
        assert_eq!(p.place("list", UpdateOp::Push(vec![json!(1)])), 0);
        assert_eq!(p.place("list", UpdateOp::Pull(vec![json!(2)])), 1);
    }

    #[test]
    fn single_statement_policy_merges_overlaps() {
        let mut p = Partitioner::new(&SingleStatementPolicy);
        assert_eq!(p.place("list.0", set(1)), 0);
        assert_eq!(p.place("list", UpdateOp::Push(vec![json!(2)])), 0);
        assert_eq!(p.into_groups().len(), 1);
    }

    #[test]
    fn later_disjoint_op_reuses_first_group() {
        let mut p = Partitioner::new(&ArrayOperatorPolicy);
        p.place("list.0", set(1));
        p.place("list", UpdateOp::Push(vec![json!(2)]));
        assert_eq!(p.place("title", set(3)), 0);
    }

    #[test]
    fn order_of_overlapping_ops_is_kept() {
        let mut p = Partitioner::new(&ArrayOperatorPolicy);
        assert_eq!(p.place("list", UpdateOp::Push(vec![json!(1)])), 0);
        assert_eq!(p.place("list", UpdateOp::Pull(vec![json!(2)])), 1);
        // conflicts with both groups, lands after the last one
        assert_eq!(p.place("list.0", set(3)), 2);
    }

    #[test]
    fn closure_policy() {
        let inc_with_anything = |a: OpKind, b: OpKind| a == OpKind::Inc || b == OpKind::Inc;
        let mut p = Partitioner::new(&inc_with_anything);
        assert_eq!(p.place("c", UpdateOp::Inc(1)), 0);
        assert_eq!(p.place("c.x", set(1)), 0);
        assert_eq!(p.place("d.x", set(1)), 0);
        assert_eq!(p.place("d", UpdateOp::Unset), 1);
    }
}
