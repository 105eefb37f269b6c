//! State diff model: what changed in a nested document.
//!
//! A [`StateDiff`] maps field names to [`StateValue`]s. Lists carry a
//! [`ListDiff`] with positional edits, tail appends and by-value removals.

pub mod codec;
pub mod types;

pub use codec::json::{from_json, from_json_str, to_json};
pub use types::{element_literal, to_literal, Delta, DiffError, ListDiff, ListEntry, StateDiff, StateValue};
