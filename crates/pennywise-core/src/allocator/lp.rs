//! Bounded single-constraint linear program
//!
//! maximize   Σ objective_i · x_i
//! subject to Σ cost_i · x_i ≤ budget,  lower_i ≤ x_i ≤ upper_i
//!
//! With one packing constraint and non-negative costs the optimum is the
//! fractional knapsack: start every variable at its lower bound, then raise
//! variables in descending objective/cost order until the budget is spent.

/// Feasibility slack on the budget constraint
const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LpTerm {
    pub objective: f64,
    /// Must be non-negative
    pub cost: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LpSolution {
    Optimal(Vec<f64>),
    /// The lower bounds alone already exceed the budget
    Infeasible,
}

pub fn solve_bounded_knapsack(terms: &[LpTerm], budget: f64) -> LpSolution {
    let mut x: Vec<f64> = terms.iter().map(|t| t.lower).collect();
    let floor: f64 = terms.iter().map(|t| t.cost * t.lower).sum();

    if floor > budget + TOLERANCE * budget.abs().max(1.0) {
        return LpSolution::Infeasible;
    }
    let mut remaining = (budget - floor).max(0.0);

    let mut order: Vec<usize> = Vec::with_capacity(terms.len());
    for (i, term) in terms.iter().enumerate() {
        if term.objective <= 0.0 || term.upper <= term.lower {
            continue;
        }
        if term.cost <= 0.0 {
            // Free to raise
            x[i] = term.upper;
        } else {
            order.push(i);
        }
    }

    let density = |i: usize| terms[i].objective / terms[i].cost;
    order.sort_by(|&a, &b| {
        density(b)
            .partial_cmp(&density(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    for i in order {
        if remaining <= 0.0 {
            break;
        }
        let term = &terms[i];
        let room = (term.upper - term.lower) * term.cost;
        if room <= remaining {
            x[i] = term.upper;
            remaining -= room;
        } else {
            x[i] = term.lower + remaining / term.cost;
            remaining = 0.0;
        }
    }

    LpSolution::Optimal(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(objective: f64, cost: f64, lower: f64) -> LpTerm {
        LpTerm {
            objective,
            cost,
            lower,
            upper: 1.0,
        }
    }

    fn solve(terms: &[LpTerm], budget: f64) -> Vec<f64> {
        match solve_bounded_knapsack(terms, budget) {
            LpSolution::Optimal(x) => x,
            LpSolution::Infeasible => panic!("expected a solution"),
        }
    }

    #[test]
    fn test_fills_best_density_first() {
        let terms = [term(3.0, 1000.0, 0.75), term(2.0, 500.0, 0.6), term(1.0, 300.0, 0.4)];
        let x = solve(&terms, 1500.0);
        assert!((x[0] - 0.75).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
        assert!((x[2] - 2.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_budget_constraint_is_tight_when_cutting() {
        let terms = [term(3.0, 1000.0, 0.75), term(2.0, 500.0, 0.6), term(1.0, 300.0, 0.4)];
        let x = solve(&terms, 1500.0);
        let spent: f64 = terms.iter().zip(&x).map(|(t, xi)| t.cost * xi).sum();
        assert!((spent - 1500.0).abs() < 1e-9);
        for (t, xi) in terms.iter().zip(&x) {
            assert!(*xi >= t.lower - 1e-12 && *xi <= t.upper + 1e-12);
        }
    }

    #[test]
    fn test_slack_budget_reaches_upper_bounds() {
        let terms = [term(1.0, 10.0, 0.5), term(1.0, 20.0, 0.5)];
        assert_eq!(solve(&terms, 100.0), vec![1.0, 1.0]);
    }

    #[test]
    fn test_infeasible_floor() {
        let terms = [term(1.0, 100.0, 0.9), term(1.0, 100.0, 0.9)];
        assert_eq!(solve_bounded_knapsack(&terms, 150.0), LpSolution::Infeasible);
    }

    #[test]
    fn test_exact_floor_is_feasible() {
        let terms = [term(1.0, 100.0, 0.5), term(2.0, 100.0, 0.5)];
        assert_eq!(solve(&terms, 100.0), vec![0.5, 0.5]);
    }

    #[test]
    fn test_zero_cost_goes_to_upper() {
        let terms = [term(1.0, 0.0, 0.4), term(1.0, 100.0, 0.4)];
        let x = solve(&terms, 40.0);
        assert_eq!(x, vec![1.0, 0.4]);
    }

    #[test]
    fn test_equal_density_prefers_earlier_term() {
        let terms = [term(1.0, 100.0, 0.0), term(1.0, 100.0, 0.0)];
        assert_eq!(solve(&terms, 50.0), vec![0.5, 0.0]);
    }
}
