//! Budget-constrained reduction plan
//!
//! Given predicted spending per group and an income, decides how much of each
//! group's spending to keep. When the total fits inside the allowed budget
//! nothing is cut. Otherwise the retained ratios come from a bounded linear
//! program that protects high-priority groups, then get pulled toward their
//! mean so no single group absorbs the whole cut.
//!
//! Smoothing happens after the solve and is not re-clamped, so the final
//! `total_target` may sit slightly above `allowed_budget`.

mod lp;

pub use lp::{solve_bounded_knapsack, LpSolution, LpTerm};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{AllocatorConfig, AnalysisConfig, Objective};
use crate::error::{Error, Result};
use crate::forecast::Projection;
use crate::models::{round2, round_to, CategoryGroup};

/// One group's predicted spending, as fed to the allocator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationItem {
    /// Group label; labels that are not a known group use the fallback policy
    pub group: String,
    pub predicted: f64,
}

impl AllocationItem {
    pub fn new(group: impl Into<String>, predicted: f64) -> Self {
        Self {
            group: group.into(),
            predicted,
        }
    }
}

impl From<&Projection> for AllocationItem {
    fn from(projection: &Projection) -> Self {
        Self::new(projection.group.as_str(), projection.predicted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationOutcome {
    /// Predictions already fit the allowed budget
    WithinBudget,
    Reduced,
    /// Group floors alone exceed the budget; nothing was cut
    Infeasible,
}

impl AllocationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WithinBudget => "within_budget",
            Self::Reduced => "reduced",
            Self::Infeasible => "infeasible",
        }
    }
}

impl std::fmt::Display for AllocationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub group: String,
    pub predicted: f64,
    /// Retained fraction of the prediction
    pub ratio: f64,
    pub target: f64,
    pub reduction_percent: f64,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub outcome: AllocationOutcome,
    pub suggestions: Vec<Suggestion>,
    pub total_predicted: f64,
    pub total_target: f64,
    pub total_reduction: f64,
    pub overshoot_percent_vs_income: f64,
    pub income: f64,
    pub allowed_budget: f64,
}

/// Advice attached to each known group
pub fn advice_for(group: CategoryGroup) -> &'static str {
    match group {
        CategoryGroup::Necessary => "Keep at the minimum needed so daily life is not affected",
        CategoryGroup::Other => "Reduce reasonably, prioritize planned spending",
        CategoryGroup::Unnecessary => "Cut hardest to avoid exceeding the budget",
    }
}

/// Pull each ratio toward the mean: r' = (1 - s)·r + s·mean
pub fn smooth_toward_mean(ratios: &[f64], strength: f64) -> Vec<f64> {
    if ratios.is_empty() {
        return Vec::new();
    }
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    ratios
        .iter()
        .map(|r| (1.0 - strength) * r + strength * mean)
        .collect()
}

pub struct Allocator<'a> {
    settings: &'a AllocatorConfig,
}

impl<'a> Allocator<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            settings: &config.allocator,
        }
    }

    pub fn with_settings(settings: &'a AllocatorConfig) -> Self {
        Self { settings }
    }

    /// Plan retained spending for `items` against `income × (1 + overshoot_ratio)`
    pub fn allocate(
        &self,
        items: &[AllocationItem],
        income: f64,
        overshoot_ratio: f64,
    ) -> Result<AllocationPlan> {
        validate(items, income, overshoot_ratio)?;

        let allowed_budget = income * (1.0 + overshoot_ratio);
        let total_predicted: f64 = items.iter().map(|i| i.predicted).sum();
        let groups: Vec<Option<CategoryGroup>> = items
            .iter()
            .map(|i| i.group.parse::<CategoryGroup>().ok())
            .collect();

        let (outcome, ratios) = if total_predicted <= allowed_budget {
            (AllocationOutcome::WithinBudget, vec![1.0; items.len()])
        } else {
            let terms: Vec<LpTerm> = items
                .iter()
                .zip(&groups)
                .map(|(item, group)| {
                    let policy = self.settings.policy(*group);
                    let objective = match self.settings.objective {
                        Objective::Ratio => policy.weight,
                        Objective::Spend => policy.weight * item.predicted,
                    };
                    LpTerm {
                        objective,
                        cost: item.predicted,
                        lower: policy.lower,
                        upper: 1.0,
                    }
                })
                .collect();

            match solve_bounded_knapsack(&terms, allowed_budget) {
                LpSolution::Optimal(solved) => {
                    debug!(?solved, objective = %self.settings.objective, "Reduction solved");
                    (
                        AllocationOutcome::Reduced,
                        smooth_toward_mean(&solved, self.settings.smoothing),
                    )
                }
                LpSolution::Infeasible => {
                    warn!(
                        total_predicted,
                        allowed_budget, "Group floors exceed the budget; no reduction applied"
                    );
                    (AllocationOutcome::Infeasible, vec![1.0; items.len()])
                }
            }
        };

        let suggestions: Vec<Suggestion> = items
            .iter()
            .zip(&groups)
            .zip(&ratios)
            .map(|((item, group), &ratio)| Suggestion {
                group: item.group.clone(),
                predicted: item.predicted,
                ratio: round_to(ratio, 4),
                target: round2(item.predicted * ratio),
                reduction_percent: round2((1.0 - ratio) * 100.0),
                suggestion: group.map(|g| advice_for(g).to_string()),
            })
            .collect();

        let total_target: f64 = suggestions.iter().map(|s| s.target).sum();
        let total_predicted = round2(total_predicted);
        let total_target = round2(total_target);

        Ok(AllocationPlan {
            outcome,
            suggestions,
            total_predicted,
            total_target,
            total_reduction: round2(total_predicted - total_target),
            overshoot_percent_vs_income: round2((total_target - income) / income * 100.0),
            income,
            allowed_budget: round2(allowed_budget),
        })
    }
}

fn validate(items: &[AllocationItem], income: f64, overshoot_ratio: f64) -> Result<()> {
    if items.is_empty() {
        return Err(Error::EmptyInput("No predictions to allocate".into()));
    }
    if !income.is_finite() || income <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "Income must be a positive number, got {}",
            income
        )));
    }
    if !overshoot_ratio.is_finite() || overshoot_ratio < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "Overshoot ratio must be zero or positive, got {}",
            overshoot_ratio
        )));
    }
    for (row, item) in items.iter().enumerate() {
        if !item.predicted.is_finite() || item.predicted < 0.0 {
            return Err(Error::malformed(
                row,
                format!(
                    "Predicted amount for '{}' must be a non-negative number, got {}",
                    item.group, item.predicted
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_items() -> Vec<AllocationItem> {
        vec![
            AllocationItem::new("Necessary", 1000.0),
            AllocationItem::new("Other", 500.0),
            AllocationItem::new("Unnecessary", 300.0),
        ]
    }

    fn find<'p>(plan: &'p AllocationPlan, group: &str) -> &'p Suggestion {
        plan.suggestions
            .iter()
            .find(|s| s.group == group)
            .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_within_budget_is_noop() {
        let config = AnalysisConfig::default();
        let allocator = Allocator::new(&config);
        let plan = allocator.allocate(&scenario_items(), 2000.0, 0.0).unwrap();

        assert_eq!(plan.outcome, AllocationOutcome::WithinBudget);
        for s in &plan.suggestions {
            assert_eq!(s.ratio, 1.0);
            assert_eq!(s.reduction_percent, 0.0);
            assert_eq!(s.target, s.predicted);
        }
        assert_eq!(plan.total_target, 1800.0);
        assert_eq!(plan.total_reduction, 0.0);
        assert!(approx(plan.overshoot_percent_vs_income, -10.0));
    }

    #[test]
    fn test_overshoot_widens_budget() {
        let config = AnalysisConfig::default();
        let allocator = Allocator::new(&config);
        let plan = allocator.allocate(&scenario_items(), 1500.0, 0.25).unwrap();
        assert_eq!(plan.allowed_budget, 1875.0);
        assert_eq!(plan.outcome, AllocationOutcome::WithinBudget);
    }

    #[test]
    fn test_ratio_objective_reduction() {
        let config = AnalysisConfig::default();
        let allocator = Allocator::new(&config);
        let plan = allocator.allocate(&scenario_items(), 1500.0, 0.0).unwrap();

        assert_eq!(plan.outcome, AllocationOutcome::Reduced);
        assert_eq!(plan.allowed_budget, 1500.0);

        let necessary = find(&plan, "Necessary");
        let other = find(&plan, "Other");
        let unnecessary = find(&plan, "Unnecessary");
        assert!(approx(necessary.ratio, 0.7833));
        assert!(approx(necessary.reduction_percent, 21.67));
        assert!(approx(necessary.target, 783.33));
        assert!(approx(other.reduction_percent, 4.17));
        assert!(approx(other.target, 479.17));
        assert!(approx(unnecessary.reduction_percent, 15.83));
        assert!(approx(unnecessary.target, 252.5));

        assert!(approx(plan.total_target, 1515.0));
        assert!(approx(plan.total_reduction, 285.0));
        // Smoothing lets the plan drift over the budget
        assert!(approx(plan.overshoot_percent_vs_income, 1.0));
    }

    #[test]
    fn test_spend_objective_protects_necessary() {
        let mut config = AnalysisConfig::default();
        config.allocator.objective = Objective::Spend;
        let allocator = Allocator::new(&config);
        let plan = allocator.allocate(&scenario_items(), 1500.0, 0.0).unwrap();

        let necessary = find(&plan, "Necessary");
        let other = find(&plan, "Other");
        let unnecessary = find(&plan, "Unnecessary");
        assert!(approx(necessary.reduction_percent, 8.4));
        assert!(approx(other.reduction_percent, 25.2));
        assert!(approx(unnecessary.reduction_percent, 50.4));
        assert!(necessary.reduction_percent < other.reduction_percent);
        assert!(other.reduction_percent < unnecessary.reduction_percent);
        assert!(approx(plan.total_target, 1438.8));
    }

    #[test]
    fn test_infeasible_applies_no_reduction() {
        let config = AnalysisConfig::default();
        let allocator = Allocator::new(&config);
        let items = vec![
            AllocationItem::new("Necessary", 1000.0),
            AllocationItem::new("Other", 500.0),
        ];
        // Floors: 750 + 300 = 1050 > 1000
        let plan = allocator.allocate(&items, 1000.0, 0.0).unwrap();

        assert_eq!(plan.outcome, AllocationOutcome::Infeasible);
        for s in &plan.suggestions {
            assert_eq!(s.ratio, 1.0);
            assert_eq!(s.reduction_percent, 0.0);
        }
        assert_eq!(plan.total_target, 1500.0);
        assert!(approx(plan.overshoot_percent_vs_income, 50.0));
    }

    #[test]
    fn test_unknown_label_uses_fallback_without_advice() {
        let config = AnalysisConfig::default();
        let allocator = Allocator::new(&config);
        let items = vec![
            AllocationItem::new("necessary", 100.0),
            AllocationItem::new("Luxury", 100.0),
        ];
        let plan = allocator.allocate(&items, 150.0, 0.0).unwrap();

        assert_eq!(plan.outcome, AllocationOutcome::Reduced);
        let known = find(&plan, "necessary");
        let unknown = find(&plan, "Luxury");
        assert_eq!(
            known.suggestion.as_deref(),
            Some(advice_for(CategoryGroup::Necessary))
        );
        assert!(unknown.suggestion.is_none());
        assert!(unknown.reduction_percent > known.reduction_percent);
    }

    #[test]
    fn test_solved_ratios_respect_bounds() {
        let config = AnalysisConfig::default();
        let settings = &config.allocator;
        let items = scenario_items();
        let terms: Vec<LpTerm> = items
            .iter()
            .map(|i| {
                let policy = settings.policy(i.group.parse().ok());
                LpTerm {
                    objective: policy.weight,
                    cost: i.predicted,
                    lower: policy.lower,
                    upper: 1.0,
                }
            })
            .collect();
        for budget in [1200.0, 1300.0, 1500.0, 1700.0] {
            let LpSolution::Optimal(x) = solve_bounded_knapsack(&terms, budget) else {
                panic!("budget {budget} should be feasible");
            };
            for (t, xi) in terms.iter().zip(&x) {
                assert!(*xi >= t.lower - 1e-12 && *xi <= 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn test_smoothing_fixed_at_mean() {
        for r in smooth_toward_mean(&[0.8, 0.8, 0.8], 0.3) {
            assert!(approx(r, 0.8));
        }
        let smoothed = smooth_toward_mean(&[1.0, 0.5], 0.3);
        assert!(approx(smoothed[0], 0.925));
        assert!(approx(smoothed[1], 0.575));
        assert!(smooth_toward_mean(&[], 0.3).is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let config = AnalysisConfig::default();
        let allocator = Allocator::new(&config);

        assert!(matches!(
            allocator.allocate(&[], 1000.0, 0.0),
            Err(Error::EmptyInput(_))
        ));
        assert!(matches!(
            allocator.allocate(&scenario_items(), 0.0, 0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            allocator.allocate(&scenario_items(), f64::NAN, 0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            allocator.allocate(&scenario_items(), 1000.0, -0.1),
            Err(Error::InvalidParameter(_))
        ));
        let bad = vec![
            AllocationItem::new("Other", 10.0),
            AllocationItem::new("Other", -1.0),
        ];
        assert!(matches!(
            allocator.allocate(&bad, 1000.0, 0.0),
            Err(Error::MalformedInput { row: Some(1), .. })
        ));
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_value(AllocationOutcome::WithinBudget).unwrap(),
            "within_budget"
        );
    }
}
