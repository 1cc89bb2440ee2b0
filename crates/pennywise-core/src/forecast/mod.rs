//! Next-month spending projections per category group
//!
//! History is every record dated before the first day of the reference
//! month. Each group's monthly totals are regressed on a month index and the
//! month after the group's last observed month is predicted. Groups with too
//! few months fall back to their monthly mean.

mod forest;

pub use forest::{RandomForest, RegressionTree};

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, ForecasterConfig};
use crate::error::{Error, Result};
use crate::models::{round2, CategoryGroup, ExpenseRecord, Month, MonthlyGroupTotal};
use crate::taxonomy::Taxonomy;

/// Message attached to mean-based projections
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Not enough data (used mean)";

/// Direction and size of the projected change against the last month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendTag {
    IncreasingStrong,
    IncreasingMild,
    Stable,
    DecreasingMild,
    DecreasingStrong,
}

impl TrendTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncreasingStrong => "increasing_strong",
            Self::IncreasingMild => "increasing_mild",
            Self::Stable => "stable",
            Self::DecreasingMild => "decreasing_mild",
            Self::DecreasingStrong => "decreasing_strong",
        }
    }

    /// Bucket a relative change; `strong` and `mild` are positive fractions
    pub fn classify(diff_ratio: f64, strong: f64, mild: f64) -> Self {
        if diff_ratio > strong {
            Self::IncreasingStrong
        } else if diff_ratio > mild {
            Self::IncreasingMild
        } else if diff_ratio < -strong {
            Self::DecreasingStrong
        } else if diff_ratio < -mild {
            Self::DecreasingMild
        } else {
            Self::Stable
        }
    }

    fn advice(&self, group: CategoryGroup, diff_ratio: f64) -> String {
        let group = group.as_str().to_lowercase();
        let pct = diff_ratio.abs() * 100.0;
        match self {
            Self::IncreasingStrong => format!(
                "Spending in {group} is projected to rise sharply (+{pct:.1}%) compared to last month. \
                 This could strain your budget; consider reviewing non-essential expenses."
            ),
            Self::IncreasingMild => format!(
                "Spending in {group} is expected to increase slightly (+{pct:.1}%). \
                 Keep an eye on it to stay within your limits."
            ),
            Self::Stable => format!(
                "Spending in {group} is expected to remain stable, with no major fluctuations."
            ),
            Self::DecreasingMild => format!(
                "Spending in {group} shows a moderate decrease (-{pct:.1}%). \
                 Maintaining this trend can improve your savings rate."
            ),
            Self::DecreasingStrong => format!(
                "Spending in {group} is projected to drop significantly (-{pct:.1}%). \
                 You're managing this budget well."
            ),
        }
    }
}

impl fmt::Display for TrendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Projected spending of one group for the month after its last observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub group: CategoryGroup,
    pub predicted: f64,
    /// Half-width of the approximate 95% band (z × residual std); 0 for the mean fallback
    pub confidence: f64,
    /// None when the projection is the insufficient-data mean
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendTag>,
    pub message: String,
    pub months_observed: usize,
    pub last_month: Month,
    pub last_month_total: f64,
    pub diff_ratio: f64,
}

/// Sum records into per-(group, month) totals, ordered by group then month
pub fn monthly_totals(records: &[ExpenseRecord], taxonomy: &Taxonomy) -> Vec<MonthlyGroupTotal> {
    group_series(records, taxonomy)
        .into_iter()
        .flat_map(|(group, months)| {
            months.into_iter().map(move |(month, amount)| MonthlyGroupTotal {
                group,
                month,
                amount,
            })
        })
        .collect()
}

fn group_series(
    records: &[ExpenseRecord],
    taxonomy: &Taxonomy,
) -> BTreeMap<CategoryGroup, BTreeMap<Month, f64>> {
    let mut series: BTreeMap<CategoryGroup, BTreeMap<Month, f64>> = BTreeMap::new();
    for record in records {
        *series
            .entry(taxonomy.classify(&record.category))
            .or_default()
            .entry(record.month())
            .or_insert(0.0) += record.amount;
    }
    series
}

pub struct Forecaster<'a> {
    taxonomy: &'a Taxonomy,
    settings: &'a ForecasterConfig,
}

impl<'a> Forecaster<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            taxonomy: &config.taxonomy,
            settings: &config.forecaster,
        }
    }

    pub fn with_parts(taxonomy: &'a Taxonomy, settings: &'a ForecasterConfig) -> Self {
        Self { taxonomy, settings }
    }

    /// Project every group seen before the month containing `today`
    pub fn forecast(&self, records: &[ExpenseRecord], today: NaiveDate) -> Result<Vec<Projection>> {
        let cutoff = Month::of(today).first_day();
        let history: Vec<ExpenseRecord> = records
            .iter()
            .filter(|r| r.date < cutoff)
            .cloned()
            .collect();

        if history.is_empty() {
            return Err(Error::NoHistory { before: cutoff });
        }

        let projections: Vec<Projection> = group_series(&history, self.taxonomy)
            .into_iter()
            .filter_map(|(group, months)| self.project(group, &months))
            .collect();

        info!(
            records = history.len(),
            groups = projections.len(),
            "Forecast complete"
        );
        Ok(projections)
    }

    fn project(&self, group: CategoryGroup, months: &BTreeMap<Month, f64>) -> Option<Projection> {
        let (&first_month, _) = months.iter().next()?;
        let (&last_month, &last_total) = months.iter().next_back()?;
        let observed = months.len();

        if observed < self.settings.min_months {
            let mean = months.values().sum::<f64>() / observed as f64;
            warn!(group = %group, months = observed, "Not enough history, using monthly mean");
            return Some(Projection {
                group,
                predicted: round2(mean),
                confidence: 0.0,
                trend: None,
                message: INSUFFICIENT_DATA_MESSAGE.to_string(),
                months_observed: observed,
                last_month,
                last_month_total: last_total,
                diff_ratio: 0.0,
            });
        }

        let x: Vec<f64> = months
            .keys()
            .map(|m| m.months_since(first_month) as f64)
            .collect();
        let y: Vec<f64> = months.values().copied().collect();

        let forest = RandomForest::fit(&x, &y, self.settings.n_trees, self.settings.seed);
        let next_index = last_month.succ().months_since(first_month) as f64;
        let predicted = forest.predict(next_index);

        let residuals: Vec<f64> = x
            .iter()
            .zip(&y)
            .map(|(xi, yi)| yi - forest.predict(*xi))
            .collect();
        let confidence = self.settings.confidence_z * population_std(&residuals);

        let diff_ratio = if last_total > 0.0 {
            (predicted - last_total) / last_total
        } else {
            0.0
        };
        let trend = TrendTag::classify(
            diff_ratio,
            self.settings.strong_change,
            self.settings.mild_change,
        );

        debug!(group = %group, months = observed, predicted, %trend, "Group projected");

        Some(Projection {
            group,
            predicted: round2(predicted),
            confidence: round2(confidence),
            trend: Some(trend),
            message: trend.advice(group, diff_ratio),
            months_observed: observed,
            last_month,
            last_month_total: last_total,
            diff_ratio,
        })
    }
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
