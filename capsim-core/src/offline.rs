//! Non-sequential oracle variant.
//!
//! Replays project arrivals without making any decisions, re-anchoring each
//! surviving project's cost profile to absolute ledger years: a snapshot
//! taken in year `t` prices "select this project in year `t`". The union of
//! every snapshot across a completed run feeds one global solve with
//! at-most-one-copy-per-id rows, which upper-bounds what any sequential
//! policy could have realized. A benchmark, not a deployable policy.

use std::time::Duration;

use crate::config::{ConfigError, SimConfig};
use crate::constants::{COST_WEIGHT, VALUE_DECAY_DIVISOR};
use crate::env::{SimState, StepOutcome};
use crate::generator::generate_projects;
use crate::ledger::BudgetLedger;
use crate::project::{CostProfile, Project};
use crate::rng::RngBundle;
use crate::solver::{BinaryProgram, Optimality, RowKey};

/// Replay environment that only observes arrivals.
///
/// Unlike the sequential environment there are no selections, no deductions
/// and no budget perturbation; the ledger stays at its configured values so
/// the oracle solve runs against a deterministic baseline.
pub struct OfflineEnv {
    cfg: SimConfig,
    horizon: usize,
    max_duration: usize,
    state: SimState,
    rng: RngBundle,
}

impl OfflineEnv {
    /// Build a replay environment from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration violates an invariant.
    pub fn new(cfg: SimConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let horizon = cfg.years;
        let max_duration = cfg.max_duration();
        let ledger_len = horizon + max_duration;
        let seed = seed.unwrap_or_else(rand::random);
        let state = SimState {
            current_year: 0,
            project_id_counter: 0,
            cumulative_reward: 0.0,
            budgets: BudgetLedger::uniform(cfg.annual_budget, ledger_len),
            available_projects: Vec::new(),
            picked_project_ids: Vec::new(),
        };
        Ok(Self {
            cfg,
            horizon,
            max_duration,
            state,
            rng: RngBundle::from_user_seed(seed),
        })
    }

    #[must_use]
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    #[must_use]
    pub const fn state(&self) -> &SimState {
        &self.state
    }

    fn ledger_len(&self) -> usize {
        self.horizon + self.max_duration
    }

    /// Reinitialize and run the year-0 generation pass.
    pub fn reset(&mut self) -> &SimState {
        self.state.current_year = 0;
        self.state.project_id_counter = 0;
        self.state.cumulative_reward = 0.0;
        self.state.budgets = BudgetLedger::uniform(self.cfg.annual_budget, self.ledger_len());
        self.state.available_projects = Vec::new();
        self.state.picked_project_ids = Vec::new();
        self.generate_new_projects();
        &self.state
    }

    /// Advance one year without selecting anything.
    ///
    /// Survivors decay and re-anchor by one year; new arrivals appear in
    /// every year except the final pre-terminal one.
    pub fn step(&mut self) -> StepOutcome {
        let survivors: Vec<Project> = self
            .state
            .available_projects
            .iter()
            .map(|project| {
                Project::new(
                    project.id,
                    project.value / VALUE_DECAY_DIVISOR,
                    shifted_profile(&project.cost_profile),
                )
            })
            .collect();
        self.state.available_projects = survivors;

        self.state.current_year += 1;
        let done = self.state.current_year >= self.horizon;
        if !done && self.state.current_year < self.horizon - 1 {
            self.generate_new_projects();
        }
        StepOutcome { reward: 0.0, done }
    }

    /// Run a full replay and return the union of every snapshot, including
    /// the year-0 arrivals.
    pub fn run_and_collect(&mut self) -> Vec<Project> {
        let mut pool = self.reset().available_projects.clone();
        loop {
            let outcome = self.step();
            pool.extend(self.state.available_projects.iter().cloned());
            if outcome.done {
                break;
            }
        }
        log::debug!("collected {} selection opportunities", pool.len());
        pool
    }

    fn generate_new_projects(&mut self) {
        let ledger_len = self.ledger_len();
        let year = self.state.current_year;
        let mut rng = self.rng.generation();
        let fresh = generate_projects(
            &self.cfg,
            self.max_duration,
            &mut self.state.project_id_counter,
            &mut *rng,
        );
        self.state.available_projects.extend(
            fresh.into_iter().map(|project| {
                let anchored = anchored_profile(&project.cost_profile, year, ledger_len);
                Project::new(project.id, project.value, anchored)
            }),
        );
    }
}

/// Left-pad a profile with `current_year` zeros and size it to the ledger.
fn anchored_profile(profile: &CostProfile, current_year: usize, ledger_len: usize) -> CostProfile {
    let mut anchored = CostProfile::new();
    anchored.resize(current_year.min(ledger_len), 0.0);
    for cost in profile {
        if anchored.len() == ledger_len {
            break;
        }
        anchored.push(*cost);
    }
    anchored.resize(ledger_len, 0.0);
    anchored
}

/// Re-anchor a profile by one elapsed year.
fn shifted_profile(profile: &CostProfile) -> CostProfile {
    let mut shifted = CostProfile::with_capacity(profile.len());
    shifted.push(0.0);
    shifted.extend(
        profile
            .iter()
            .copied()
            .take(profile.len().saturating_sub(1)),
    );
    shifted
}

/// Result of the oracle solve.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleSolution {
    /// One decision per pooled snapshot, in pool order.
    pub selection: Vec<bool>,
    /// Total value of the selected snapshots.
    pub total_value: f64,
    /// Ledger left after charging every selected snapshot.
    pub remaining_budgets: Vec<f64>,
    pub optimality: Optimality,
}

/// Solve the global selection program over a pool of absolute-anchored
/// snapshots: budget rows per ledger year, plus at-most-one rows for ids
/// that appear in several years.
#[must_use]
pub fn solve_oracle(
    projects: &[Project],
    budgets: &[f64],
    time_limit: Option<Duration>,
) -> OracleSolution {
    let mut program = BinaryProgram::new(projects.len());
    let cost_columns = projects
        .iter()
        .map(|p| p.cost_profile.len())
        .max()
        .unwrap_or(0);

    for (var, project) in projects.iter().enumerate() {
        let visible_cost: f64 = project.cost_profile.iter().take(budgets.len()).sum();
        program.set_objective(var, project.value - COST_WEIGHT * visible_cost);
    }
    for year in 0..budgets.len().min(cost_columns) {
        let coefficients: Vec<f64> = projects
            .iter()
            .map(|p| p.cost_profile.get(year).copied().unwrap_or(0.0))
            .collect();
        program.add_row(RowKey::Budget { year }, coefficients, budgets[year]);
    }

    let mut ids: Vec<u64> = projects.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    ids.dedup();
    for id in ids {
        let coefficients: Vec<f64> = projects
            .iter()
            .map(|p| if p.id == id { 1.0 } else { 0.0 })
            .collect();
        if coefficients.iter().sum::<f64>() > 1.0 {
            program.add_row(RowKey::SingleSelect { project_id: id }, coefficients, 1.0);
        }
    }

    let solution = program.solve(time_limit);

    let mut remaining = budgets.to_vec();
    let mut total_value = 0.0;
    for (project, picked) in projects.iter().zip(&solution.selection) {
        if *picked {
            total_value += project.value;
            for (year, cost) in project.cost_profile.iter().enumerate().take(remaining.len()) {
                remaining[year] -= cost;
            }
        }
    }
    OracleSolution {
        selection: solution.selection,
        total_value,
        remaining_budgets: remaining,
        optimality: solution.optimality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn test_config() -> SimConfig {
        SimConfig {
            years: 5,
            annual_budget: 55.0,
            num_slots: 3,
            slot_probability: 1.0,
            ..SimConfig::default_config()
        }
    }

    #[test]
    fn reset_anchors_year_zero_profiles_at_the_origin() {
        let mut env = OfflineEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let ledger_len = 5 + 7;
        for project in &env.state().available_projects {
            assert_eq!(project.cost_profile.len(), ledger_len);
            assert!(project.cost_profile[0] > 0.0);
        }
    }

    #[test]
    fn step_decays_and_reanchors_survivors() {
        let mut env = OfflineEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let before = env.state().available_projects.clone();
        env.step();
        for (old, new) in before.iter().zip(&env.state().available_projects) {
            assert_eq!(new.id, old.id);
            assert!((new.value - old.value / 1.1).abs() < 1e-12);
            assert_eq!(new.cost_profile[0], 0.0);
            assert_eq!(new.cost_profile[1], old.cost_profile[0]);
        }
    }

    #[test]
    fn arrivals_in_later_years_carry_leading_zeros() {
        let mut env = OfflineEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let first_batch = env.state().available_projects.len();
        env.step();
        let fresh = &env.state().available_projects[first_batch..];
        assert!(!fresh.is_empty());
        for project in fresh {
            assert_eq!(project.cost_profile[0], 0.0);
            assert!(project.cost_profile[1] > 0.0);
        }
    }

    #[test]
    fn no_arrivals_on_the_final_pre_terminal_year() {
        let mut env = OfflineEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let mut steps = 0;
        let mut counts = Vec::new();
        loop {
            let outcome = env.step();
            steps += 1;
            counts.push(env.state().available_projects.len());
            if outcome.done {
                break;
            }
        }
        assert_eq!(steps, env.horizon());
        // Years 1..3 generate, year 4 (the last before termination) and the
        // terminal year do not.
        let len = counts.len();
        assert_eq!(counts[len - 1], counts[len - 2]);
        assert_eq!(counts[len - 2], counts[len - 3]);
        assert!(counts[len - 3] > counts[len - 4]);
    }

    #[test]
    fn collected_pool_holds_one_copy_per_year_per_project() {
        let mut env = OfflineEnv::new(test_config(), Some(42)).unwrap();
        let pool = env.run_and_collect();
        let copies: Vec<&Project> = pool.iter().filter(|p| p.id == 0).collect();
        assert_eq!(copies.len(), env.horizon() + 1);
        for pair in copies.windows(2) {
            assert!((pair[0].value / pair[1].value - 1.1).abs() < 1e-9);
        }
    }

    #[test]
    fn oracle_selects_at_most_one_copy_per_id() {
        let pool = vec![
            Project::new(0, 10.0, smallvec![5.0, 0.0]),
            Project::new(0, 10.0 / 1.1, smallvec![0.0, 5.0]),
        ];
        let solution = solve_oracle(&pool, &[10.0, 10.0], None);
        let picked = solution.selection.iter().filter(|s| **s).count();
        assert_eq!(picked, 1);
        // The undecayed year-0 copy wins.
        assert_eq!(solution.selection, vec![true, false]);
    }

    #[test]
    fn oracle_never_overdraws_the_ledger() {
        let pool = vec![
            Project::new(0, 30.0, smallvec![6.0, 0.0]),
            Project::new(1, 20.0, smallvec![6.0, 0.0]),
            Project::new(2, 10.0, smallvec![0.0, 6.0]),
        ];
        let solution = solve_oracle(&pool, &[10.0, 10.0], None);
        for slot in &solution.remaining_budgets {
            assert!(*slot >= -1e-9);
        }
        assert_eq!(solution.selection, vec![true, false, true]);
        assert!((solution.total_value - 40.0).abs() < 1e-9);
    }

    #[test]
    fn oracle_on_an_empty_pool_returns_nothing() {
        let solution = solve_oracle(&[], &[10.0], None);
        assert!(solution.selection.is_empty());
        assert_eq!(solution.total_value, 0.0);
        assert_eq!(solution.remaining_budgets, vec![10.0]);
    }

    #[test]
    fn replay_is_deterministic_per_seed() {
        let mut first = OfflineEnv::new(test_config(), Some(9)).unwrap();
        let mut second = OfflineEnv::new(test_config(), Some(9)).unwrap();
        assert_eq!(first.run_and_collect(), second.run_and_collect());
    }
}
