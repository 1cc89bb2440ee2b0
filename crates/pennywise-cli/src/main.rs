//! Pennywise CLI - Personal expense analysis
//!
//! Usage:
//!   pennywise evaluate --file expenses.csv     Score last month's spending
//!   pennywise forecast --file expenses.csv     Project next month per group
//!   pennywise plan --file expenses.csv --income 3000
//!   pennywise serve --port 5000                Start the REST API

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Evaluate {
            file,
            budget,
            income,
            prev_expenses,
            month,
            today,
            json,
        } => commands::cmd_evaluate(
            config_path,
            &file,
            commands::EvaluateArgs {
                budget,
                income,
                prev_expenses,
                month,
                today,
            },
            json,
        ),
        Commands::Forecast { file, today, json } => {
            commands::cmd_forecast(config_path, &file, today, json)
        }
        Commands::Suggest {
            predictions,
            income,
            overshoot,
            json,
        } => commands::cmd_suggest(config_path, &predictions, income, overshoot, json),
        Commands::Plan {
            file,
            income,
            overshoot,
            today,
            json,
        } => commands::cmd_plan(config_path, &file, income, overshoot, today, json),
        Commands::Config => commands::cmd_config(config_path),
        Commands::Serve {
            port,
            host,
            allowed_origins,
        } => commands::cmd_serve(config_path, &host, port, allowed_origins).await,
    }
}
