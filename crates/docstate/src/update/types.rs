//! Core types for compiled updates.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

// ── Operations ────────────────────────────────────────────────────────────

/// Kind of a path-addressed update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Set,
    Unset,
    Inc,
    Push,
    Pull,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Set => "set",
            OpKind::Unset => "unset",
            OpKind::Inc => "inc",
            OpKind::Push => "push",
            OpKind::Pull => "pull",
        }
    }

    fn bit(self) -> u8 {
        match self {
            OpKind::Set => 1,
            OpKind::Unset => 1 << 1,
            OpKind::Inc => 1 << 2,
            OpKind::Push => 1 << 3,
            OpKind::Pull => 1 << 4,
        }
    }

    const ALL: [OpKind; 5] = [OpKind::Set, OpKind::Unset, OpKind::Inc, OpKind::Push, OpKind::Pull];
}

/// A small set of [`OpKind`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpKinds(u8);

impl OpKinds {
    pub fn insert(&mut self, kind: OpKind) {
        self.0 |= kind.bit();
    }

    pub fn contains(&self, kind: OpKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = OpKind> + '_ {
        OpKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

/// An update applied at one path.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Replace the value at the path.
    Set(Value),
    /// Remove the field at the path.
    Unset,
    /// Add to the number at the path.
    Inc(i64),
    /// Append values at the tail of the list at the path.
    Push(Vec<Value>),
    /// Remove every list element equal to one of the values.
    Pull(Vec<Value>),
}

impl UpdateOp {
    pub fn kind(&self) -> OpKind {
        match self {
            UpdateOp::Set(_) => OpKind::Set,
            UpdateOp::Unset => OpKind::Unset,
            UpdateOp::Inc(_) => OpKind::Inc,
            UpdateOp::Push(_) => OpKind::Push,
            UpdateOp::Pull(_) => OpKind::Pull,
        }
    }
}

// ── UpdateGroup ───────────────────────────────────────────────────────────

/// How a group checks a list edited by index before it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The list still equals its snapshot value.
    Snapshot,
    /// The list still has its snapshot length. Used by groups applied after
    /// the first one touching the list, whose content may already differ.
    Length,
}

/// Operations that can be applied together in one atomic store statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateGroup {
    pub(crate) ops: IndexMap<String, UpdateOp>,
    pub(crate) guards: IndexMap<String, Guard>,
}

impl UpdateGroup {
    pub fn get(&self, path: &str) -> Option<&UpdateOp> {
        self.ops.get(path)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.ops.contains_key(path)
    }

    /// Operations in the order they were compiled.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UpdateOp)> {
        self.ops.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Lists that must still match the snapshot for this group to apply.
    pub fn guards(&self) -> impl Iterator<Item = (&str, Guard)> {
        self.guards.iter().map(|(k, g)| (k.as_str(), *g))
    }
}

// ── ConditionSet ──────────────────────────────────────────────────────────

/// Rendered paths of the lists that were edited by index.
///
/// Recording the same path twice keeps a single entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    paths: IndexSet<String>,
}

impl ConditionSet {
    /// Records a path, returning its position and whether it was new.
    pub fn insert(&mut self, path: &str) -> (usize, bool) {
        match self.paths.get_index_of(path) {
            Some(i) => (i, false),
            None => self.paths.insert_full(path.to_string()),
        }
    }

    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.paths.get_index_of(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// ── CompiledUpdate ────────────────────────────────────────────────────────

/// The result of compiling one state diff.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledUpdate {
    /// Groups in the order they were opened; none is empty.
    pub groups: Vec<UpdateGroup>,
    pub conditions: ConditionSet,
}

impl CompiledUpdate {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of operations over all groups.
    pub fn op_count(&self) -> usize {
        self.groups.iter().map(UpdateGroup::len).sum()
    }
}
