// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! envgate-check: validate an environment file and print a diagnostic report

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use envgate::config::{self, validate, Mode, RawVariables};
use envgate::report::{recommendations, render_report};

#[derive(Parser)]
#[command(name = "envgate-check")]
#[command(author, version, about = "Validate environment configuration before deploying")]
struct Cli {
    /// Environment file to load before validating (a missing file is not an error)
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Validate as this mode instead of the one in NODE_ENV
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match dotenvy::from_path(&cli.env_file) {
        Ok(()) => {}
        Err(e) if e.not_found() => {
            eprintln!(
                "note: {} not found, validating the process environment only",
                cli.env_file.display()
            );
        }
        Err(e) => anyhow::bail!("Failed to read {}: {}", cli.env_file.display(), e),
    }

    let raw = RawVariables::from_process();
    let mode = cli.mode.unwrap_or_else(|| config::detect_mode(&raw));
    let result = validate(&raw, mode);

    if cli.json {
        let output = serde_json::json!({
            "mode": mode,
            "build_phase": raw.is_build_phase(),
            "is_valid": result.is_valid,
            "errors": result.errors,
            "warnings": result.warnings,
            "recommendations": recommendations(mode, &result),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let color = !cli.no_color && console::colors_enabled();
        print!("{}", render_report(&raw, mode, &result, color));
    }

    Ok(if result.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
