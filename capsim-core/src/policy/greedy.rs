//! Greedy ranked-list policies.
//!
//! Both variants rank the available projects, then walk the ranking and
//! accept every project a local copy of the remaining budgets can absorb,
//! deducting immediately so later candidates see the reduced availability.
//! No backtracking. Ties keep input order (stable sort), so the
//! earlier-listed project wins. Cost entries at or past the horizon are
//! ignored by the affordability check; tail spend beyond the planning window
//! is never charged against any budget.

use std::cmp::Ordering;

use crate::env::SimState;
use crate::project::Project;

use super::SelectionPolicy;

/// Ranks by value per unit of total cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyRatio;

/// Ranks by raw value, ignoring cost entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyValue;

impl SelectionPolicy for GreedyRatio {
    fn name(&self) -> &'static str {
        "greedy-ratio"
    }

    fn solve(&self, state: &SimState, horizon: usize) -> Vec<bool> {
        ranked_selection(state, horizon, value_per_cost)
    }
}

impl SelectionPolicy for GreedyValue {
    fn name(&self) -> &'static str {
        "greedy-value"
    }

    fn solve(&self, state: &SimState, horizon: usize) -> Vec<bool> {
        ranked_selection(state, horizon, raw_value)
    }
}

fn value_per_cost(project: &Project) -> f64 {
    let total = project.total_cost();
    if total > 0.0 {
        project.value / total
    } else {
        // A costless project beats every priced one.
        f64::INFINITY
    }
}

fn raw_value(project: &Project) -> f64 {
    project.value
}

fn ranked_selection(state: &SimState, horizon: usize, key: fn(&Project) -> f64) -> Vec<bool> {
    let projects = &state.available_projects;
    let current_year = state.current_year;
    let visible_years = horizon.saturating_sub(current_year);
    let mut selected = vec![false; projects.len()];

    let keys: Vec<f64> = projects.iter().map(key).collect();
    let mut order: Vec<usize> = (0..projects.len()).collect();
    order.sort_by(|&a, &b| keys[b].partial_cmp(&keys[a]).unwrap_or(Ordering::Equal));

    let mut remaining = state.budgets.to_vec();
    for &index in &order {
        let project = &projects[index];
        if !can_afford(project, &remaining, current_year, visible_years) {
            continue;
        }
        selected[index] = true;
        for (offset, cost) in project.cost_profile.iter().enumerate().take(visible_years) {
            if let Some(slot) = remaining.get_mut(current_year + offset) {
                *slot -= cost;
            }
        }
    }
    selected
}

fn can_afford(
    project: &Project,
    remaining: &[f64],
    current_year: usize,
    visible_years: usize,
) -> bool {
    for (offset, cost) in project.cost_profile.iter().enumerate() {
        if offset >= visible_years {
            break;
        }
        let Some(slot) = remaining.get(current_year + offset) else {
            break;
        };
        if slot - cost < 0.0 {
            return false;
        }
    }
    true
}
