//! `docstate-compile` — compile a state diff into store update statements.
//!
//! Usage:
//!   docstate-compile --id <doc-id> [--id-json] [--snapshot <file>] [--policy array|single] [--config <file.toml>]
//!
//! The JSON-encoded diff is read from stdin. Set `RUST_LOG=docstate=trace` to
//! log every rendered statement.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use docstate::cli::{compile, load_config, parse_id, CliError, CompileConfig, PolicyKind};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "docstate-compile", about = "Compile a state diff into store update statements")]
struct Args {
    /// Document id placed in every statement filter.
    #[arg(long)]
    id: String,

    /// Parse `--id` as a JSON value (number, object, quoted string) instead
    /// of taking it as a string.
    #[arg(long)]
    id_json: bool,

    /// JSON file holding the document as read before the diff was computed.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Grouping policy; overrides the config file.
    #[arg(long, value_enum)]
    policy: Option<PolicyKind>,

    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(args: Args) -> Result<String, CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(&std::fs::read_to_string(path)?)?,
        None => CompileConfig::default(),
    };
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    let id = parse_id(&args.id, args.id_json)?;
    let snapshot = args.snapshot.as_ref().map(std::fs::read_to_string).transpose()?;

    let mut diff = String::new();
    io::stdin().read_to_string(&mut diff)?;

    compile(diff.trim(), snapshot.as_deref(), &id, &config)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(result) => {
            let mut out = io::stdout();
            if let Err(e) = out.write_all(result.as_bytes()).and_then(|_| out.write_all(b"\n")) {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
