//! Update compiler: turns a state diff into grouped store updates.
//!
//! # Output
//!
//! - [`UpdateGroup`]s, each applicable in one atomic statement, holding
//!   `Set`, `Unset`, `Inc`, `Push` and `Pull` operations keyed by dotted path.
//! - A [`ConditionSet`] of the list paths edited by index. Each group holding
//!   an operation beneath such a list guards it: the first one by the list's
//!   snapshot value, later ones by its snapshot length. A failed guard means
//!   another writer restructured the list and the caller must recompute the
//!   diff from a fresh snapshot.

pub mod builder;
pub mod codec;
pub mod grouping;
pub mod types;

pub use builder::{build, build_with};
pub use codec::mongo::{group_to_document, to_statements, ChangeToken, RenderOptions, Statement};
pub use grouping::{ArrayOperatorPolicy, GroupingPolicy, Partitioner, SingleStatementPolicy};
pub use types::{CompiledUpdate, ConditionSet, Guard, OpKind, OpKinds, UpdateGroup, UpdateOp};
