//! Pennywise Core Library
//!
//! Spending analysis for personal expense records:
//! - Record ingestion from JSON and CSV
//! - Category taxonomy (Necessary / Unnecessary / Other)
//! - Monthly evaluation against budget, income and the previous month
//! - Per-group next-month forecasting with a seeded random forest
//! - Budget-constrained reduction plans
//! - Layered TOML configuration
//!
//! Every operation takes its reference date explicitly, so results are
//! reproducible for a given input.

pub mod allocator;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod forecast;
pub mod models;
pub mod planner;
pub mod records;
pub mod taxonomy;

pub use allocator::{
    AllocationItem, AllocationOutcome, AllocationPlan, Allocator, LpSolution, Suggestion,
};
pub use config::{
    AllocatorConfig, AnalysisConfig, ConfigSource, EvaluatorConfig, ForecasterConfig, GroupPolicy,
    Objective,
};
pub use error::{Error, Result};
pub use evaluator::{
    BudgetStatus, CategoryStatus, EvaluationInput, EvaluationReport, Evaluator, OverallStatus,
    SavingsStatus, TopStatus, TrendStatus,
};
pub use forecast::{Forecaster, Projection, TrendTag};
pub use models::{CategoryGroup, CategorySpend, ExpenseRecord, Month, MonthlyGroupTotal};
pub use planner::{PlanReport, Planner};
pub use records::{load_records, parse_records, RawAmount, RawRecord};
pub use taxonomy::Taxonomy;
