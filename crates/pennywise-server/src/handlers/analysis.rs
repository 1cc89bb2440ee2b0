//! Evaluation, forecast and allocation handlers

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use crate::{AppError, AppState};
use pennywise_core::{
    parse_records, AllocationItem, AllocationPlan, Allocator, EvaluationInput, EvaluationReport,
    Evaluator, ExpenseRecord, Forecaster, Month, PlanReport, Planner, Projection, RawRecord,
};

/// Request body for POST /api/evaluate
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub records: Option<Vec<RawRecord>>,
    pub budget: Option<f64>,
    pub income: Option<f64>,
    pub prev_expenses: Option<f64>,
    /// Evaluate this month instead of the one before `today`
    pub month: Option<Month>,
    pub today: Option<NaiveDate>,
}

/// Request body for POST /api/predict
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub records: Option<Vec<RawRecord>>,
    pub today: Option<NaiveDate>,
}

/// Request body for POST /api/suggest
///
/// Predictions may carry extra projection fields; only `group` and
/// `predicted` are read.
#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub predictions: Option<Vec<AllocationItem>>,
    pub income: Option<f64>,
    pub max_exceed_ratio: Option<f64>,
}

/// Request body for POST /api/plan
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub records: Option<Vec<RawRecord>>,
    pub income: Option<f64>,
    pub max_exceed_ratio: Option<f64>,
    pub today: Option<NaiveDate>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::bad_request(&rejection.body_text()))
}

fn records_field(raw: Option<Vec<RawRecord>>) -> Result<Vec<ExpenseRecord>, AppError> {
    let raw = raw.ok_or_else(|| AppError::missing_field("records"))?;
    Ok(parse_records(&raw)?)
}

fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

/// POST /api/evaluate - Score a month of spending
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<EvaluationReport>, AppError> {
    let req = body(payload)?;
    let records = records_field(req.records)?;

    let defaults = EvaluationInput::default();
    let input = EvaluationInput {
        monthly_budget: req.budget.unwrap_or(defaults.monthly_budget),
        monthly_income: req.income.unwrap_or(defaults.monthly_income),
        prev_total_expenses: req.prev_expenses.unwrap_or(defaults.prev_total_expenses),
    };

    let evaluator = Evaluator::new(&state.analysis);
    let report = match req.month {
        Some(month) => evaluator.evaluate(&records, &input, month)?,
        None => evaluator.evaluate_previous_month(&records, &input, today_or_now(req.today))?,
    };

    debug!(month = %report.month_evaluated, score = report.score, "Evaluate request served");
    Ok(Json(report))
}

/// POST /api/predict - Project next month's spending per group
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Vec<Projection>>, AppError> {
    let req = body(payload)?;
    let records = records_field(req.records)?;

    let projections =
        Forecaster::new(&state.analysis).forecast(&records, today_or_now(req.today))?;

    Ok(Json(projections))
}

/// POST /api/suggest - Build a reduction plan from predictions
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<AllocationPlan>, AppError> {
    let req = body(payload)?;
    let predictions = req
        .predictions
        .ok_or_else(|| AppError::missing_field("predictions"))?;
    let income = req.income.ok_or_else(|| AppError::missing_field("income"))?;

    let plan = Allocator::new(&state.analysis).allocate(
        &predictions,
        income,
        req.max_exceed_ratio.unwrap_or(0.0),
    )?;

    debug!(outcome = %plan.outcome, "Suggest request served");
    Ok(Json(plan))
}

/// POST /api/plan - Forecast and allocate in one call
pub async fn plan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Json<PlanReport>, AppError> {
    let req = body(payload)?;
    let records = records_field(req.records)?;
    let income = req.income.ok_or_else(|| AppError::missing_field("income"))?;

    let report = Planner::new(&state.analysis).plan(
        &records,
        income,
        req.max_exceed_ratio.unwrap_or(0.0),
        today_or_now(req.today),
    )?;

    Ok(Json(report))
}
