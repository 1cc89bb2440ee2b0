//! Error types for Pennywise

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Month;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed input{}: {reason}", .row.map(|r| format!(" at row {}", r)).unwrap_or_default())]
    MalformedInput { row: Option<usize>, reason: String },

    #[error("No expense data found for {period}")]
    NoDataForPeriod { period: Month },

    #[error("No historical data before {before} to forecast from")]
    NoHistory { before: NaiveDate },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            row: Some(row),
            reason: reason.into(),
        }
    }

    /// Stable snake_case tag for transport layers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput { .. } => "malformed_input",
            Self::NoDataForPeriod { .. } => "no_data_for_period",
            Self::NoHistory { .. } => "no_history",
            Self::EmptyInput(_) => "empty_input",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Csv(_) => "csv",
            Self::Json(_) => "json",
        }
    }

    /// True for conditions that describe the caller's data rather than a failure
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::NoDataForPeriod { .. } | Self::NoHistory { .. } | Self::EmptyInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_includes_row() {
        let err = Error::malformed(3, "Unable to parse date: yesterday");
        assert_eq!(
            err.to_string(),
            "Malformed input at row 3: Unable to parse date: yesterday"
        );
        assert_eq!(err.kind(), "malformed_input");
        assert!(!err.is_reportable());
    }

    #[test]
    fn test_no_data_is_reportable() {
        let err = Error::NoDataForPeriod {
            period: Month::new(2025, 9).unwrap(),
        };
        assert_eq!(err.to_string(), "No expense data found for 2025-09");
        assert!(err.is_reportable());
    }
}
