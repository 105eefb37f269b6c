//! docstate — compiles nested document state diffs into store updates.
//!
//! Provides the state diff model, the update builder with its pluggable
//! grouping policy, an operator-document codec for path-addressed document
//! stores, and the logic behind the `docstate-compile` binary.
//!
//! # Example
//!
//! ```
//! use docstate::state_diff::{ListDiff, StateDiff};
//! use docstate::update::{build, UpdateOp};
//! use serde_json::json;
//!
//! let diff = StateDiff::new()
//!     .with("title", json!("Report"))
//!     .with("tags", ListDiff::positional(vec![json!("final").into()]).with_append(vec![json!("q3").into()]));
//!
//! let compiled = build(&diff).unwrap();
//! assert_eq!(compiled.groups.len(), 2);
//! assert_eq!(compiled.groups[0].get("tags.0"), Some(&UpdateOp::Set(json!("final"))));
//! assert!(compiled.conditions.contains("tags"));
//! ```

pub mod state_diff;
pub mod update;
pub mod cli;
