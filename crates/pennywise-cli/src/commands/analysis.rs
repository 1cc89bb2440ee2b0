//! Analysis command implementations (evaluate, forecast, suggest, plan)

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pennywise_core::{
    load_records, AllocationItem, AllocationOutcome, AllocationPlan, Allocator, AnalysisConfig,
    EvaluationInput, EvaluationReport, Evaluator, ExpenseRecord, Forecaster, Month, PlanReport,
    Planner, Projection,
};
use serde::Deserialize;

use super::{load_config, resolve_today, truncate};

/// Baselines and period selection for `evaluate`
#[derive(Debug, Clone, Copy)]
pub struct EvaluateArgs {
    pub budget: f64,
    pub income: f64,
    pub prev_expenses: f64,
    pub month: Option<Month>,
    pub today: Option<NaiveDate>,
}

/// Prediction files: a bare array, `{"predictions": [...]}`, or `plan --json` output
#[derive(Deserialize)]
#[serde(untagged)]
enum PredictionFile {
    Bare(Vec<AllocationItem>),
    Wrapped { predictions: Vec<AllocationItem> },
    Plan { forecast: Vec<AllocationItem> },
}

fn read_records(file: &Path) -> Result<Vec<ExpenseRecord>> {
    load_records(file).with_context(|| format!("Failed to load records from {}", file.display()))
}

/// Read allocation inputs from a JSON predictions file
pub fn load_predictions(path: &Path) -> Result<Vec<AllocationItem>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let parsed: PredictionFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid predictions file {}", path.display()))?;

    Ok(match parsed {
        PredictionFile::Bare(items) => items,
        PredictionFile::Wrapped { predictions } => predictions,
        PredictionFile::Plan { forecast } => forecast,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ========== Evaluate ==========

pub fn run_evaluate(
    config: &AnalysisConfig,
    file: &Path,
    args: EvaluateArgs,
) -> Result<EvaluationReport> {
    let records = read_records(file)?;
    let input = EvaluationInput {
        monthly_budget: args.budget,
        monthly_income: args.income,
        prev_total_expenses: args.prev_expenses,
    };

    let evaluator = Evaluator::new(config);
    let report = match args.month {
        Some(month) => evaluator.evaluate(&records, &input, month)?,
        None => evaluator.evaluate_previous_month(&records, &input, resolve_today(args.today))?,
    };
    Ok(report)
}

pub fn cmd_evaluate(
    config_path: Option<&Path>,
    file: &Path,
    args: EvaluateArgs,
    json: bool,
) -> Result<()> {
    let (config, _) = load_config(config_path)?;
    let report = run_evaluate(&config, file, args)?;

    if json {
        return print_json(&report);
    }

    println!();
    println!("📊 Spending Evaluation: {}", report.month_evaluated);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Total:        ${:.2} (budget ${:.2}) - {}",
        report.total_expenses, args.budget, report.budget_status
    );
    println!(
        "   Unnecessary:  {:.1}% of total - {}",
        report.unnecessary_ratio * 100.0,
        report.category_status
    );
    println!(
        "   Trend:        {:+.1}% vs previous month - {}",
        report.trend * 100.0,
        report.trend_status
    );
    println!(
        "   Savings:      {:.1}% of income - {}",
        report.savings_ratio * 100.0,
        report.savings_status
    );
    println!(
        "   Top category: {} ({:.1}%) - {}",
        report.top_category,
        report.top_ratio * 100.0,
        report.top_status
    );
    println!();
    println!(
        "   {:25} │ {:>10} │ {:>6}",
        "Category", "Amount", "%"
    );
    println!("   ──────────────────────────┼────────────┼────────");
    for spend in &report.category_summary {
        let share = if report.total_expenses > 0.0 {
            spend.amount / report.total_expenses * 100.0
        } else {
            0.0
        };
        println!(
            "   {:25} │ {:>10.2} │ {:>5.1}%",
            truncate(&spend.category, 25),
            spend.amount,
            share
        );
    }
    println!();

    let icon = match report.overall_status {
        pennywise_core::OverallStatus::Good => "✅",
        pennywise_core::OverallStatus::NeedsImprovement => "⚠️ ",
        pennywise_core::OverallStatus::Poor => "❌",
    };
    println!(
        "   {} Overall: {} (score {}/5)",
        icon, report.overall_status, report.score
    );
    println!();

    Ok(())
}

// ========== Forecast ==========

pub fn run_forecast(
    config: &AnalysisConfig,
    file: &Path,
    today: Option<NaiveDate>,
) -> Result<Vec<Projection>> {
    let records = read_records(file)?;
    Ok(Forecaster::new(config).forecast(&records, resolve_today(today))?)
}

fn print_projections(projections: &[Projection]) {
    println!(
        "   {:12} │ {:>10} │ {:>9} │ {:>6} │ {:17}",
        "Group", "Predicted", "± 95%", "Months", "Trend"
    );
    println!("   ─────────────┼────────────┼───────────┼────────┼──────────────────");
    for p in projections {
        println!(
            "   {:12} │ {:>10.2} │ {:>9.2} │ {:>6} │ {:17}",
            p.group.as_str(),
            p.predicted,
            p.confidence,
            p.months_observed,
            p.trend.map(|t| t.as_str()).unwrap_or("-")
        );
    }
    println!();
    for p in projections {
        println!("   {}: {}", p.group, p.message);
    }
}

pub fn cmd_forecast(
    config_path: Option<&Path>,
    file: &Path,
    today: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let (config, _) = load_config(config_path)?;
    let projections = run_forecast(&config, file, today)?;

    if json {
        return print_json(&projections);
    }

    println!();
    println!("🔮 Next-Month Forecast");
    println!("   ─────────────────────────────────────────────────────────────");
    print_projections(&projections);
    println!();

    Ok(())
}

// ========== Suggest ==========

pub fn run_suggest(
    config: &AnalysisConfig,
    predictions: &Path,
    income: f64,
    overshoot: f64,
) -> Result<AllocationPlan> {
    let items = load_predictions(predictions)?;
    Ok(Allocator::new(config).allocate(&items, income, overshoot)?)
}

fn print_allocation(plan: &AllocationPlan) {
    match plan.outcome {
        AllocationOutcome::WithinBudget => {
            println!("   ✅ Predicted spending fits the budget, no cuts needed")
        }
        AllocationOutcome::Reduced => println!("   ✂️  Reductions needed to fit the budget"),
        AllocationOutcome::Infeasible => {
            println!("   ⚠️  Budget cannot be met even at minimum levels, no cuts applied")
        }
    }
    println!();
    println!(
        "   {:12} │ {:>10} │ {:>10} │ {:>7}",
        "Group", "Predicted", "Target", "Cut"
    );
    println!("   ─────────────┼────────────┼────────────┼────────");
    for s in &plan.suggestions {
        println!(
            "   {:12} │ {:>10.2} │ {:>10.2} │ {:>6.2}%",
            truncate(&s.group, 12),
            s.predicted,
            s.target,
            s.reduction_percent
        );
    }
    println!();
    println!(
        "   Predicted: ${:.2}   Target: ${:.2}   Saved: ${:.2}",
        plan.total_predicted, plan.total_target, plan.total_reduction
    );
    println!(
        "   Income: ${:.2}   Allowed: ${:.2}   Target vs income: {:+.2}%",
        plan.income, plan.allowed_budget, plan.overshoot_percent_vs_income
    );

    let advice: Vec<_> = plan
        .suggestions
        .iter()
        .filter_map(|s| s.suggestion.as_deref().map(|text| (&s.group, text)))
        .collect();
    if !advice.is_empty() {
        println!();
        for (group, text) in advice {
            println!("   💡 {}: {}", group, text);
        }
    }
}

pub fn cmd_suggest(
    config_path: Option<&Path>,
    predictions: &Path,
    income: f64,
    overshoot: f64,
    json: bool,
) -> Result<()> {
    let (config, _) = load_config(config_path)?;
    let plan = run_suggest(&config, predictions, income, overshoot)?;

    if json {
        return print_json(&plan);
    }

    println!();
    println!("💰 Reduction Plan");
    println!("   ─────────────────────────────────────────────────────────────");
    print_allocation(&plan);
    println!();

    Ok(())
}

// ========== Plan ==========

pub fn run_plan(
    config: &AnalysisConfig,
    file: &Path,
    income: f64,
    overshoot: f64,
    today: Option<NaiveDate>,
) -> Result<PlanReport> {
    let records = read_records(file)?;
    Ok(Planner::new(config).plan(&records, income, overshoot, resolve_today(today))?)
}

pub fn cmd_plan(
    config_path: Option<&Path>,
    file: &Path,
    income: f64,
    overshoot: f64,
    today: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let (config, _) = load_config(config_path)?;
    let report = run_plan(&config, file, income, overshoot, today)?;

    if json {
        return print_json(&report);
    }

    println!();
    println!("🔮 Next-Month Forecast");
    println!("   ─────────────────────────────────────────────────────────────");
    print_projections(&report.forecast);
    println!();
    println!("💰 Reduction Plan");
    println!("   ─────────────────────────────────────────────────────────────");
    print_allocation(&report.allocation);
    println!();

    Ok(())
}
