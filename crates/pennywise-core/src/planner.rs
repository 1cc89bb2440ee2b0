//! Forecast-then-allocate pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocator::{AllocationItem, AllocationPlan, Allocator};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::forecast::{Forecaster, Projection};
use crate::models::ExpenseRecord;

/// Next-month projections together with the reduction plan built from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub forecast: Vec<Projection>,
    pub allocation: AllocationPlan,
}

pub struct Planner<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> Planner<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn plan(
        &self,
        records: &[ExpenseRecord],
        income: f64,
        overshoot_ratio: f64,
        today: NaiveDate,
    ) -> Result<PlanReport> {
        let forecast = Forecaster::new(self.config).forecast(records, today)?;
        let items: Vec<AllocationItem> = forecast.iter().map(AllocationItem::from).collect();
        let allocation = Allocator::new(self.config).allocate(&items, income, overshoot_ratio)?;

        Ok(PlanReport {
            forecast,
            allocation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::AllocationOutcome;
    use crate::error::Error;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plan_feeds_forecast_into_allocation() {
        let config = AnalysisConfig::default();
        let planner = Planner::new(&config);
        let records = vec![
            ExpenseRecord::new(date(2025, 8, 2), "Rent/Mortgage", 1000.0),
            ExpenseRecord::new(date(2025, 8, 9), "Shopping", 300.0),
            ExpenseRecord::new(date(2025, 8, 20), "Gifts", 500.0),
        ];

        let report = planner.plan(&records, 1500.0, 0.0, date(2025, 9, 5)).unwrap();
        assert_eq!(report.forecast.len(), 3);
        assert_eq!(report.allocation.suggestions.len(), 3);
        assert_eq!(report.allocation.total_predicted, 1800.0);
        assert_eq!(report.allocation.outcome, AllocationOutcome::Reduced);
        assert_eq!(report.allocation.suggestions[0].group, "Necessary");
    }

    #[test]
    fn test_plan_propagates_forecast_error() {
        let config = AnalysisConfig::default();
        let planner = Planner::new(&config);
        let err = planner.plan(&[], 1500.0, 0.0, date(2025, 9, 5)).unwrap_err();
        assert!(matches!(err, Error::NoHistory { .. }));
    }
}
