//! Modsphere analyzer: builds the module graph of a Python project.
//!
//! Usage:
//!   modsphere-analyze <PROJECT_DIR> <OUTPUT_FILE> [--json]

use anyhow::{Context, Result};
use clap::Parser;

use modsphere::cli::{analyze, AnalyzeArgs};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = AnalyzeArgs::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &AnalyzeArgs) -> Result<()> {
    let stats = analyze(args)
        .with_context(|| format!("analysis of {} failed", args.project_dir.display()))?;
    println!("{}", stats);
    println!("Graph written to {}", args.output.display());
    Ok(())
}
