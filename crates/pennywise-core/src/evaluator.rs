//! Monthly spending evaluation
//!
//! Scores one calendar month of spending against a budget, income, the
//! previous month's total and a category-mix rule. The month is chosen by the
//! caller; [`Evaluator::evaluate_previous_month`] picks the month before a
//! reference date.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AnalysisConfig, EvaluatorConfig};
use crate::error::{Error, Result};
use crate::models::{CategoryGroup, CategorySpend, ExpenseRecord, Month};
use crate::taxonomy::Taxonomy;

/// Sentinel reported as top category when a period has no categories
pub const NO_CATEGORY: &str = "N/A";

/// Baselines the month is judged against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub monthly_budget: f64,
    pub monthly_income: f64,
    /// Total spending of the month before the evaluated one
    pub prev_total_expenses: f64,
}

impl Default for EvaluationInput {
    fn default() -> Self {
        Self {
            monthly_budget: 2000.0,
            monthly_income: 3000.0,
            prev_total_expenses: 1800.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetStatus {
    Good,
    Exceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryStatus {
    Good,
    #[serde(rename = "Too much unnecessary spending")]
    TooMuchUnnecessary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendStatus {
    Increased,
    Decreased,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavingsStatus {
    Good,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopStatus {
    Warning,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    Good,
    #[serde(rename = "Needs improvement")]
    NeedsImprovement,
    Poor,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Exceeded => "Exceeded",
        }
    }
}

impl CategoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::TooMuchUnnecessary => "Too much unnecessary spending",
        }
    }
}

impl TrendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increased => "Increased",
            Self::Decreased => "Decreased",
            Self::Stable => "Stable",
        }
    }
}

impl SavingsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Low => "Low",
        }
    }
}

impl TopStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "Warning",
            Self::Normal => "Normal",
        }
    }
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs improvement",
            Self::Poor => "Poor",
        }
    }

    /// Map the count of healthy indicators (out of five) to a rating
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 4 => Self::Good,
            s if s >= 2 => Self::NeedsImprovement,
            _ => Self::Poor,
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        })*
    };
}

impl_display!(
    BudgetStatus,
    CategoryStatus,
    TrendStatus,
    SavingsStatus,
    TopStatus,
    OverallStatus
);

/// Evaluation of one month of spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub month_evaluated: Month,
    pub total_expenses: f64,
    pub budget_status: BudgetStatus,
    pub necessary_sum: f64,
    pub unnecessary_sum: f64,
    pub other_sum: f64,
    /// Fraction of the total spent on unnecessary categories
    pub unnecessary_ratio: f64,
    pub category_status: CategoryStatus,
    /// Relative change against the previous month's total
    pub trend: f64,
    pub trend_status: TrendStatus,
    pub savings_ratio: f64,
    pub savings_status: SavingsStatus,
    pub top_category: String,
    pub top_ratio: f64,
    pub top_status: TopStatus,
    /// Healthy indicators out of five
    pub score: u8,
    pub overall_status: OverallStatus,
    /// Per-category totals, largest first
    pub category_summary: Vec<CategorySpend>,
}

/// Scores a month of spending
pub struct Evaluator<'a> {
    taxonomy: &'a Taxonomy,
    thresholds: &'a EvaluatorConfig,
}

impl<'a> Evaluator<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            taxonomy: &config.taxonomy,
            thresholds: &config.evaluator,
        }
    }

    pub fn with_parts(taxonomy: &'a Taxonomy, thresholds: &'a EvaluatorConfig) -> Self {
        Self {
            taxonomy,
            thresholds,
        }
    }

    /// Evaluate the calendar month before `today`
    pub fn evaluate_previous_month(
        &self,
        records: &[ExpenseRecord],
        input: &EvaluationInput,
        today: NaiveDate,
    ) -> Result<EvaluationReport> {
        self.evaluate(records, input, Month::of(today).pred())
    }

    /// Evaluate an explicit month
    pub fn evaluate(
        &self,
        records: &[ExpenseRecord],
        input: &EvaluationInput,
        period: Month,
    ) -> Result<EvaluationReport> {
        let in_period: Vec<&ExpenseRecord> =
            records.iter().filter(|r| period.contains(r.date)).collect();

        if in_period.is_empty() {
            return Err(Error::NoDataForPeriod { period });
        }

        let total: f64 = in_period.iter().map(|r| r.amount).sum();

        let budget_status = if total <= input.monthly_budget {
            BudgetStatus::Good
        } else {
            BudgetStatus::Exceeded
        };

        let (mut necessary_sum, mut unnecessary_sum, mut other_sum) = (0.0, 0.0, 0.0);
        let mut by_category: HashMap<&str, f64> = HashMap::new();
        for record in &in_period {
            match self.taxonomy.classify(&record.category) {
                CategoryGroup::Necessary => necessary_sum += record.amount,
                CategoryGroup::Unnecessary => unnecessary_sum += record.amount,
                CategoryGroup::Other => other_sum += record.amount,
            }
            *by_category.entry(record.category.as_str()).or_insert(0.0) += record.amount;
        }

        let unnecessary_ratio = ratio_or_zero(unnecessary_sum, total);
        let category_status = if unnecessary_ratio <= self.thresholds.unnecessary_max_ratio {
            CategoryStatus::Good
        } else {
            CategoryStatus::TooMuchUnnecessary
        };

        let trend = if input.prev_total_expenses > 0.0 {
            (total - input.prev_total_expenses) / input.prev_total_expenses
        } else {
            0.0
        };
        let trend_status = if trend < 0.0 {
            TrendStatus::Decreased
        } else if trend > 0.0 {
            TrendStatus::Increased
        } else {
            TrendStatus::Stable
        };

        let savings_ratio = if input.monthly_income > 0.0 {
            1.0 - total / input.monthly_income
        } else {
            0.0
        };
        let savings_status = if savings_ratio >= self.thresholds.savings_min_ratio {
            SavingsStatus::Good
        } else {
            SavingsStatus::Low
        };

        let mut category_summary: Vec<CategorySpend> = by_category
            .into_iter()
            .map(|(category, amount)| CategorySpend {
                category: category.to_string(),
                amount,
            })
            .collect();
        category_summary.sort_by(|a, b| {
            b.amount
                .partial_cmp(&a.amount)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.category.cmp(&b.category))
        });

        let (top_category, top_ratio) = match category_summary.first() {
            Some(top) => (top.category.clone(), ratio_or_zero(top.amount, total)),
            None => (NO_CATEGORY.to_string(), 0.0),
        };
        let top_status = if top_ratio > self.thresholds.top_category_max_ratio {
            TopStatus::Warning
        } else {
            TopStatus::Normal
        };

        let score = [
            budget_status == BudgetStatus::Good,
            category_status == CategoryStatus::Good,
            matches!(trend_status, TrendStatus::Decreased | TrendStatus::Stable),
            savings_status == SavingsStatus::Good,
            top_status == TopStatus::Normal,
        ]
        .iter()
        .filter(|ok| **ok)
        .count() as u8;
        let overall_status = OverallStatus::from_score(score);

        debug!(
            month = %period,
            records = in_period.len(),
            total,
            score,
            "Month evaluated"
        );

        Ok(EvaluationReport {
            month_evaluated: period,
            total_expenses: total,
            budget_status,
            necessary_sum,
            unnecessary_sum,
            other_sum,
            unnecessary_ratio,
            category_status,
            trend,
            trend_status,
            savings_ratio,
            savings_status,
            top_category,
            top_ratio,
            top_status,
            score,
            overall_status,
            category_summary,
        })
    }
}

fn ratio_or_zero(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(d: NaiveDate, category: &str, amount: f64) -> ExpenseRecord {
        ExpenseRecord::new(d, category, amount)
    }

    fn input(budget: f64, income: f64, prev: f64) -> EvaluationInput {
        EvaluationInput {
            monthly_budget: budget,
            monthly_income: income,
            prev_total_expenses: prev,
        }
    }

    #[test]
    fn test_single_grocery_month() {
        let config = AnalysisConfig::default();
        let evaluator = Evaluator::new(&config);
        let records = vec![record(date(2025, 9, 1), "Groceries", 100.0)];

        let report = evaluator
            .evaluate_previous_month(&records, &input(200.0, 500.0, 100.0), date(2025, 10, 17))
            .unwrap();

        assert_eq!(report.month_evaluated, Month::new(2025, 9).unwrap());
        assert_eq!(report.total_expenses, 100.0);
        assert_eq!(report.budget_status, BudgetStatus::Good);
        assert_eq!(report.unnecessary_ratio, 0.0);
        assert_eq!(report.category_status, CategoryStatus::Good);
        assert_eq!(report.trend, 0.0);
        assert_eq!(report.trend_status, TrendStatus::Stable);
        assert!((report.savings_ratio - 0.8).abs() < 1e-12);
        assert_eq!(report.savings_status, SavingsStatus::Good);
        assert_eq!(report.top_category, "Groceries");
        assert_eq!(report.top_ratio, 1.0);
        assert_eq!(report.top_status, TopStatus::Warning);
        assert_eq!(report.score, 4);
        assert_eq!(report.overall_status, OverallStatus::Good);
    }

    #[test]
    fn test_no_data_reports_period() {
        let config = AnalysisConfig::default();
        let evaluator = Evaluator::new(&config);
        let records = vec![record(date(2025, 10, 2), "Groceries", 100.0)];

        let err = evaluator
            .evaluate_previous_month(&records, &EvaluationInput::default(), date(2025, 10, 17))
            .unwrap_err();
        match err {
            Error::NoDataForPeriod { period } => assert_eq!(period.to_string(), "2025-09"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_january_evaluates_previous_december() {
        let config = AnalysisConfig::default();
        let evaluator = Evaluator::new(&config);
        let records = vec![record(date(2024, 12, 31), "Utilities", 80.0)];

        let report = evaluator
            .evaluate_previous_month(&records, &EvaluationInput::default(), date(2025, 1, 1))
            .unwrap();
        assert_eq!(report.month_evaluated.to_string(), "2024-12");
    }

    #[test]
    fn test_group_sums_match_per_record_classification() {
        let config = AnalysisConfig::default();
        let evaluator = Evaluator::new(&config);
        let records = vec![
            record(date(2025, 9, 1), "Groceries", 200.0),
            record(date(2025, 9, 2), "Shopping", 150.0),
            record(date(2025, 9, 3), "Entertainment", 50.0),
            record(date(2025, 9, 4), "Gifts", 100.0),
            record(date(2025, 9, 5), "Rent/Mortgage", 500.0),
            record(date(2025, 8, 5), "Shopping", 999.0),
        ];

        let report = evaluator
            .evaluate(&records, &EvaluationInput::default(), Month::new(2025, 9).unwrap())
            .unwrap();

        let expected = |group: CategoryGroup| -> f64 {
            records
                .iter()
                .filter(|r| r.date.format("%Y-%m").to_string() == "2025-09")
                .filter(|r| config.taxonomy.classify(&r.category) == group)
                .map(|r| r.amount)
                .sum()
        };
        assert_eq!(report.necessary_sum, expected(CategoryGroup::Necessary));
        assert_eq!(report.unnecessary_sum, expected(CategoryGroup::Unnecessary));
        assert_eq!(report.other_sum, expected(CategoryGroup::Other));
        assert_eq!(
            report.necessary_sum + report.unnecessary_sum + report.other_sum,
            report.total_expenses
        );
        assert!((report.unnecessary_ratio - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_poor_month() {
        let config = AnalysisConfig::default();
        let evaluator = Evaluator::new(&config);
        let records = vec![
            record(date(2025, 9, 1), "Shopping", 900.0),
            record(date(2025, 9, 2), "Groceries", 100.0),
        ];

        let report = evaluator
            .evaluate(&records, &input(500.0, 1000.0, 400.0), Month::new(2025, 9).unwrap())
            .unwrap();

        assert_eq!(report.budget_status, BudgetStatus::Exceeded);
        assert_eq!(report.category_status, CategoryStatus::TooMuchUnnecessary);
        assert_eq!(report.trend_status, TrendStatus::Increased);
        assert!((report.trend - 1.5).abs() < 1e-12);
        assert_eq!(report.savings_status, SavingsStatus::Low);
        assert_eq!(report.top_status, TopStatus::Warning);
        assert_eq!(report.score, 0);
        assert_eq!(report.overall_status, OverallStatus::Poor);
    }

    #[test]
    fn test_zero_income_and_baseline() {
        let config = AnalysisConfig::default();
        let evaluator = Evaluator::new(&config);
        let records = vec![record(date(2025, 9, 1), "Groceries", 10.0)];

        let report = evaluator
            .evaluate(&records, &input(100.0, 0.0, 0.0), Month::new(2025, 9).unwrap())
            .unwrap();
        assert_eq!(report.savings_ratio, 0.0);
        assert_eq!(report.savings_status, SavingsStatus::Low);
        assert_eq!(report.trend, 0.0);
        assert_eq!(report.trend_status, TrendStatus::Stable);
    }

    #[test]
    fn test_zero_amount_month_has_zero_ratios() {
        let config = AnalysisConfig::default();
        let evaluator = Evaluator::new(&config);
        let records = vec![record(date(2025, 9, 1), "Shopping", 0.0)];

        let report = evaluator
            .evaluate(&records, &EvaluationInput::default(), Month::new(2025, 9).unwrap())
            .unwrap();
        assert_eq!(report.unnecessary_ratio, 0.0);
        assert_eq!(report.top_ratio, 0.0);
        assert_eq!(report.top_status, TopStatus::Normal);
        assert_eq!(report.trend_status, TrendStatus::Decreased);
    }

    #[test]
    fn test_category_summary_order() {
        let config = AnalysisConfig::default();
        let evaluator = Evaluator::new(&config);
        let records = vec![
            record(date(2025, 9, 1), "Utilities", 50.0),
            record(date(2025, 9, 2), "Groceries", 75.0),
            record(date(2025, 9, 3), "Groceries", 25.0),
            record(date(2025, 9, 4), "Healthcare", 100.0),
        ];

        let report = evaluator
            .evaluate(&records, &EvaluationInput::default(), Month::new(2025, 9).unwrap())
            .unwrap();
        let names: Vec<&str> = report
            .category_summary
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(names, vec!["Groceries", "Healthcare", "Utilities"]);
        assert_eq!(report.top_category, "Groceries");
    }

    #[test]
    fn test_status_serialization_labels() {
        assert_eq!(
            serde_json::to_value(CategoryStatus::TooMuchUnnecessary).unwrap(),
            "Too much unnecessary spending"
        );
        assert_eq!(
            serde_json::to_value(OverallStatus::NeedsImprovement).unwrap(),
            "Needs improvement"
        );
        assert_eq!(OverallStatus::from_score(3), OverallStatus::NeedsImprovement);
        assert_eq!(OverallStatus::from_score(1), OverallStatus::Poor);
    }
}
