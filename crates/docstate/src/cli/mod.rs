//! Core logic behind the `docstate-compile` binary.
//!
//! Reads a JSON-encoded state diff and prints the store statements it
//! compiles to.

use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::state_diff::{from_json_str, DiffError};
use crate::update::codec::mongo::{to_statements, RenderOptions};
use crate::update::{build_with, ArrayOperatorPolicy, GroupingPolicy, SingleStatementPolicy};

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Diff(#[from] DiffError),
    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

// ── Config ────────────────────────────────────────────────────────────────

/// Which grouping policy to compile with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Separate statements for overlapping list operators.
    #[default]
    Array,
    /// Everything in one statement where possible.
    Single,
}

impl PolicyKind {
    pub fn policy(self) -> &'static dyn GroupingPolicy {
        match self {
            PolicyKind::Array => &ArrayOperatorPolicy,
            PolicyKind::Single => &SingleStatementPolicy,
        }
    }
}

/// Settings read from a TOML file.
///
/// ```toml
/// policy = "array"
///
/// [render]
/// id_key = "ecm:id"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    pub policy: PolicyKind,
    pub render: RenderOptions,
}

pub fn load_config(text: &str) -> Result<CompileConfig, CliError> {
    Ok(toml::from_str(text)?)
}

// ── docstate-compile ──────────────────────────────────────────────────────

/// Document id from the command line: the raw string, or the JSON value it
/// encodes when `as_json` is set.
pub fn parse_id(raw: &str, as_json: bool) -> Result<Value, CliError> {
    if as_json {
        Ok(serde_json::from_str(raw)?)
    } else {
        Ok(Value::String(raw.to_string()))
    }
}

/// Compile a JSON diff into a pretty-printed JSON array of statements.
///
/// Without a snapshot every guarded list is pinned to `null`.
pub fn compile(
    diff_json: &str,
    snapshot_json: Option<&str>,
    id: &Value,
    config: &CompileConfig,
) -> Result<String, CliError> {
    let diff = from_json_str(diff_json)?;
    let snapshot: Value = match snapshot_json {
        Some(s) => serde_json::from_str(s)?,
        None => Value::Null,
    };
    let compiled = build_with(&diff, config.policy.policy())?;
    let statements = to_statements(id, &compiled, &snapshot, None, &config.render);
    Ok(serde_json::to_string_pretty(&statements)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_full_config() {
        let config = load_config("policy = \"single\"\n[render]\nid_key = \"ecm:id\"\n").unwrap();
        assert_eq!(config.policy, PolicyKind::Single);
        assert_eq!(config.render.id_key, "ecm:id");
    }

    #[test]
    fn load_empty_config_uses_defaults() {
        assert_eq!(load_config("").unwrap(), CompileConfig::default());
    }

    #[test]
    fn load_config_rejects_unknown_policy() {
        assert!(matches!(load_config("policy = \"merge\""), Err(CliError::Config(_))));
    }

    #[test]
    fn compile_with_snapshot() {
        let out = compile(
            r#"{"tags": {"$list": {"diff": ["z"]}}}"#,
            Some(r#"{"tags": ["a", "b"]}"#),
            &Value::from("doc-1"),
            &CompileConfig::default(),
        )
        .unwrap();
        let statements: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            statements,
            serde_json::json!([{
                "filter": {"_id": "doc-1", "tags": ["a", "b"]},
                "update": {"$set": {"tags.0": "z"}}
            }])
        );
    }

    #[test]
    fn id_stays_string_by_default() {
        for raw in ["42", "true", "null", "007", "doc-1"] {
            assert_eq!(parse_id(raw, false).unwrap(), Value::from(raw));
        }
    }

    #[test]
    fn id_json_flag_parses_value() {
        assert_eq!(parse_id("42", true).unwrap(), serde_json::json!(42));
        assert_eq!(parse_id(r#""007""#, true).unwrap(), serde_json::json!("007"));
        assert!(matches!(parse_id("007", true), Err(CliError::Json(_))));
    }

    #[test]
    fn compile_numeric_id() {
        let id = parse_id("42", true).unwrap();
        let out = compile(r#"{"a": 1}"#, None, &id, &CompileConfig::default()).unwrap();
        let statements: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(statements[0]["filter"]["_id"], serde_json::json!(42));
    }

    #[test]
    fn compile_reports_malformed_diff() {
        let id = Value::from("x");
        let err = compile(r#"{"a": {"$nop": true}}"#, None, &id, &CompileConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Diff(DiffError::Decode(_))));
    }
}
