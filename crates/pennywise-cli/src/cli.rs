//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pennywise_core::Month;

/// Pennywise - Evaluate, forecast and trim your monthly spending
#[derive(Parser)]
#[command(name = "pennywise")]
#[command(about = "Personal expense evaluation, forecasting and budget planning", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Analysis config file (defaults to the user data dir, then built-in values)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate last month's spending against budget and income
    Evaluate {
        /// Expense records (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Monthly budget
        #[arg(long, default_value = "2000")]
        budget: f64,

        /// Monthly income
        #[arg(long, default_value = "3000")]
        income: f64,

        /// Total spending of the month before the evaluated one
        #[arg(long, default_value = "1800")]
        prev_expenses: f64,

        /// Evaluate this month (YYYY-MM) instead of the previous one
        #[arg(long)]
        month: Option<Month>,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forecast next month's spending per category group
    Forecast {
        /// Expense records (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print projections as JSON
        #[arg(long)]
        json: bool,
    },

    /// Suggest reductions for predicted spending
    Suggest {
        /// JSON predictions: `forecast --json` output or [{"group", "predicted"}]
        #[arg(short, long)]
        predictions: PathBuf,

        /// Monthly income
        #[arg(long)]
        income: f64,

        /// Fraction the plan may exceed income by (e.g. 0.1)
        #[arg(long, default_value = "0")]
        overshoot: f64,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forecast next month and suggest reductions in one step
    Plan {
        /// Expense records (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Monthly income
        #[arg(long)]
        income: f64,

        /// Fraction the plan may exceed income by (e.g. 0.1)
        #[arg(long, default_value = "0")]
        overshoot: f64,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print the forecast and plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved analysis configuration
    Config,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable; any origin when omitted)
        #[arg(long = "allowed-origin")]
        allowed_origins: Vec<String>,
    },
}
