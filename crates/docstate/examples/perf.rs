//! Compile throughput benchmark.
//!
//! Run:  cargo run --example perf --release -p docstate

use std::time::Instant;

use docstate::state_diff::{ListDiff, ListEntry, StateDiff, StateValue};
use docstate::update::codec::mongo::{to_statements, RenderOptions};
use docstate::update::build;
use serde_json::json;

// ── harness ───────────────────────────────────────────────────────────────────

fn bench<F: FnMut()>(n: u32, mut f: F) -> u64 {
    let warmup = std::cmp::max(5, n / 10);
    for _ in 0..warmup {
        f();
    }
    let start = Instant::now();
    for _ in 0..n {
        f();
    }
    let elapsed = start.elapsed();
    (n as f64 / elapsed.as_secs_f64()) as u64
}

fn fmt(n: u64) -> String {
    // comma-grouped number
    let s = n.to_string();
    let mut out = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}

fn row(label: &str, ops: u64) {
    println!("  {:<24}  {:>16} op/s", label, fmt(ops));
}

fn wide_diff(fields: usize, depth: usize) -> StateDiff {
    let mut diff = StateDiff::with_capacity(fields);
    for i in 0..fields {
        let mut value = StateValue::Scalar(json!(i));
        for level in 0..depth {
            value = StateDiff::new().with(format!("l{level}"), value).into();
        }
        diff.insert(format!("field{i}"), value);
    }
    diff
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() {
    println!("\n  docstate  update compiler\n");
    println!("  {:<24}  {:>16}", "operation", "ops/sec");
    println!("  {}", "-".repeat(46));

    // ── 1. small document edit ────────────────────────────────────────────────
    {
        let diff = StateDiff::new()
            .with("title", json!("Quarterly report"))
            .with("meta", StateDiff::new().with("author", json!("jd")).with("draft", StateValue::Absent))
            .with(
                "tags",
                ListDiff::positional(vec![ListEntry::Nop, json!("final").into()])
                    .with_append(vec![json!("q3").into()]),
            );
        row("small_edit", bench(100_000, || {
            let _ = build(&diff).unwrap();
        }));

        let compiled = build(&diff).unwrap();
        let snapshot = json!({"title": "Report", "tags": ["a", "draft"]});
        let options = RenderOptions::default();
        row("small_render", bench(100_000, || {
            let _ = to_statements(&json!("doc"), &compiled, &snapshot, None, &options);
        }));
    }

    // ── 2. 10k fields × depth 4, plain maps ───────────────────────────────────
    {
        let diff = wide_diff(10_000, 4);
        row("wide_10k_depth4", bench(50, || {
            let compiled = build(&diff).unwrap();
            assert_eq!(compiled.groups.len(), 1);
        }));
    }

    // ── 3. 1k lists with positional + append ──────────────────────────────────
    {
        let mut diff = StateDiff::with_capacity(1_000);
        for i in 0..1_000 {
            diff.insert(
                format!("list{i}"),
                ListDiff::positional(vec![json!(i).into()]).with_append(vec![json!(i + 1).into()]),
            );
        }
        row("lists_1k_split", bench(200, || {
            let compiled = build(&diff).unwrap();
            assert_eq!(compiled.groups.len(), 2);
        }));
    }

    println!();
}
