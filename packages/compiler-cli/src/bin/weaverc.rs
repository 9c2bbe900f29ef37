//! `weaverc` — compile-time dependency-injection code generator CLI.
//!
//! Walks a project for annotated host source files, runs them through the
//! `weaver_compiler` pipeline, and writes generated wiring code to the
//! configured output directory (spec §1, §6).

use std::path::PathBuf;
use std::process;

use clap::Parser;

use weaver_compiler_cli::run::{run, FileOutcome};

#[derive(Parser, Debug)]
#[command(name = "weaverc", version, about = "Compile-time DI code generator")]
struct Cli {
    /// Project root to scan; defaults to the current directory.
    #[arg(default_value = ".")]
    project: PathBuf,

    /// Path to `weaver.config.json`, overriding the project root's default.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let outcome = match run(&cli.project, cli.config.as_deref()) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("weaverc: internal error: {err:#}");
            process::exit(2);
        }
    };

    let mut compiled = 0usize;
    let mut failed = 0usize;
    for result in &outcome.results {
        match result {
            FileOutcome::Compiled { file, written } => {
                compiled += 1;
                tracing::info!(file = %file.display(), outputs = written.len(), "compiled");
            }
            FileOutcome::Failed { file, error } => {
                failed += 1;
                eprintln!("{}: {error}", file.display());
            }
        }
    }
    tracing::info!(compiled, failed, "weaverc finished");

    process::exit(outcome.exit_code());
}
