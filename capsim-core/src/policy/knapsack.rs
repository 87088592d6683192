//! Knapsack policies backed by the binary-program solver.
//!
//! One binary variable per available project; one capacity row per visible
//! year offset. The objective is dominated by project value, with a small
//! total-cost term that steers the solver toward the cheaper of two
//! equal-value selections.

use std::time::Duration;

use crate::constants::COST_WEIGHT;
use crate::env::SimState;
use crate::solver::{BinaryProgram, RowKey};

use super::SelectionPolicy;

/// Myopic knapsack: optimizes over currently known projects and budgets only.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyopicKnapsack {
    /// Optional wall-clock limit for the underlying solve; expiry returns the
    /// best incumbent instead of the proven optimum.
    pub time_limit: Option<Duration>,
}

/// Myopic knapsack that withholds a fraction of every future year's budget,
/// reserving room for opportunities that have not arrived yet.
#[derive(Debug, Clone, Copy)]
pub struct AlphaMyopic {
    /// Fraction of each future year's budget withheld, in `[0, 1]`. Zero
    /// degenerates to the plain myopic policy; one permits spending only in
    /// the current year.
    pub alpha: f64,
    pub time_limit: Option<Duration>,
}

impl AlphaMyopic {
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            time_limit: None,
        }
    }
}

impl SelectionPolicy for MyopicKnapsack {
    fn name(&self) -> &'static str {
        "myopic-knapsack"
    }

    fn solve(&self, state: &SimState, horizon: usize) -> Vec<bool> {
        solve_selection(state, horizon, 0.0, self.time_limit)
    }
}

impl SelectionPolicy for AlphaMyopic {
    fn name(&self) -> &'static str {
        "alpha-myopic"
    }

    fn solve(&self, state: &SimState, horizon: usize) -> Vec<bool> {
        solve_selection(state, horizon, self.alpha, self.time_limit)
    }
}

fn solve_selection(
    state: &SimState,
    horizon: usize,
    alpha: f64,
    time_limit: Option<Duration>,
) -> Vec<bool> {
    if state.available_projects.is_empty() {
        return Vec::new();
    }
    let program = build_selection_program(state, horizon, alpha);
    let solution = program.solve(time_limit);
    if !solution.optimality.is_proven() {
        log::warn!("knapsack solve hit its time limit; using best incumbent");
    }
    debug_assert!(program.satisfies(&solution.selection));
    solution.selection
}

/// Build the selection program for a state snapshot.
///
/// Budget rows cover year offsets in `[0, horizon - current_year)` that both
/// the ledger and the cost profiles reach. The current year keeps its full
/// budget; every future year is scaled by `1 - alpha`. Capacities of
/// already-overdrawn years clamp to zero inside the solver, so the empty
/// selection always stays feasible.
pub(crate) fn build_selection_program(
    state: &SimState,
    horizon: usize,
    alpha: f64,
) -> BinaryProgram {
    let projects = &state.available_projects;
    let current_year = state.current_year;
    let ledger = state.budgets.as_slice();

    let cost_columns = projects
        .iter()
        .map(|p| p.cost_profile.len())
        .max()
        .unwrap_or(0);
    let ledger_years = ledger.len().saturating_sub(current_year);
    let constrained_years = horizon
        .saturating_sub(current_year)
        .min(ledger_years)
        .min(cost_columns);

    let mut program = BinaryProgram::new(projects.len());
    for (var, project) in projects.iter().enumerate() {
        let visible_cost: f64 = project.cost_profile.iter().take(ledger_years).sum();
        program.set_objective(var, project.value - COST_WEIGHT * visible_cost);
    }
    for year in 0..constrained_years {
        let coefficients: Vec<f64> = projects
            .iter()
            .map(|p| p.cost_profile.get(year).copied().unwrap_or(0.0))
            .collect();
        let capacity = if year == 0 {
            ledger[current_year]
        } else {
            (1.0 - alpha) * ledger[current_year + year]
        };
        program.add_row(RowKey::Budget { year }, coefficients, capacity);
    }
    program
}
