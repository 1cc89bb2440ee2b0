//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analysis` - Evaluate, forecast, suggest and plan commands
//! - `settings` - Configuration display command
//! - `serve` - Web server command

pub mod analysis;
pub mod serve;
pub mod settings;

// Re-export command functions for main.rs
pub use analysis::*;
pub use serve::*;
pub use settings::*;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use pennywise_core::{AnalysisConfig, ConfigSource};
use tracing::debug;

/// Load the analysis config, honoring an explicit `--config` path
pub fn load_config(path: Option<&Path>) -> Result<(AnalysisConfig, ConfigSource)> {
    let (config, source) = AnalysisConfig::load(path).context("Failed to load configuration")?;
    debug!("Using configuration from {}", source);
    Ok((config, source))
}

/// Reference date for period selection: the explicit value or the local date
pub fn resolve_today(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
