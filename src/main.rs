//! `dep-license-report` — normalize dependency licenses, evaluate them against
//! an allow-list policy, and render license reports.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and install logging ([`telemetry`]).
//! 2. Load the config and layer CLI overrides on top ([`config::load_config`]).
//! 3. Read the resolved dependency list ([`input`]).
//! 4. Build the alias table, policy, filters and importers, then run them
//!    ([`pipeline::Pipeline`]).
//! 5. Render every configured artifact concurrently ([`report::dispatch`]).
//! 6. Print the console summary ([`report::terminal`]).
//! 7. Exit `1` when the fail-on threshold is met, `2` when only a renderer
//!    failed, `0` otherwise. Fatal errors abort before rendering.

mod cli;
mod config;
mod error;
mod filter;
mod importer;
mod input;
mod license;
mod models;
mod pipeline;
mod policy;
mod registry;
mod report;
mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use cli::Cli;
use config::load_config;
use pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose, cli.quiet);

    // Resolve project path
    let project_dir = cli
        .project
        .canonicalize()
        .unwrap_or_else(|_| cli.project.clone());

    let mut config = load_config(&project_dir, cli.config.as_deref())?;
    cli.apply_overrides(&mut config, &project_dir);

    let input_path = cli.input_path(&project_dir);
    tracing::debug!(input = %input_path.display(), "reading dependency list");
    let input = input::load_dependencies(&input_path)?;

    let project = config
        .project
        .clone()
        .or_else(|| input.project.clone())
        .or_else(|| {
            project_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "project".to_string());

    let renderers = report::from_config(&config.renderers);
    let pipeline = Pipeline::from_config(&config, &project, cli.quiet)?;
    let report = Arc::new(pipeline.run(input).await?);

    let dispatch = report::dispatch(Arc::clone(&report), &renderers).await;
    report::terminal::render(&report, &dispatch, cli.verbose, cli.quiet);

    let code = pipeline::exit_code(&report, &config.fail_on, &dispatch);
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
