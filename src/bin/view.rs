//! Modsphere viewer: lays out a saved module graph and prints the scene.
//!
//! Usage:
//!   modsphere-view <INPUT_FILE> [--seed N] [--select MOD_PATH] [--json]

use anyhow::{Context, Result};
use clap::Parser;

use modsphere::cli::{render_text, view, ViewArgs};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = ViewArgs::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &ViewArgs) -> Result<()> {
    let scene = view(args).with_context(|| format!("cannot view {}", args.input.display()))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&scene)?);
    } else {
        print!("{}", render_text(&scene));
    }
    Ok(())
}
