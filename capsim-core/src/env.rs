//! Year-over-year simulation state machine.
//!
//! The environment owns the full state aggregate and mutates it only inside
//! `reset` and `step`; policies receive a read-only view. Cost profiles use
//! the sequential convention: offset `k` always means "k years after the year
//! of selection", so carried-over projects keep their profiles untouched and
//! charges land at absolute ledger index `selection_year + k`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, SimConfig};
use crate::generator::generate_projects;
use crate::ledger::BudgetLedger;
use crate::project::Project;
use crate::rng::RngBundle;

/// Aggregate state of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimState {
    /// Zero-based year index; the run is terminal once it reaches the horizon.
    pub current_year: usize,
    /// Next project id to assign.
    pub project_id_counter: u64,
    /// Running sum of realized project values.
    pub cumulative_reward: f64,
    /// Remaining budget per ledger year.
    pub budgets: BudgetLedger,
    /// Projects currently open for selection, in generation/carry-over order.
    pub available_projects: Vec<Project>,
    /// Append-only log of selected project ids across the whole run.
    pub picked_project_ids: Vec<u64>,
}

/// Result of advancing the simulation by one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Sum of values realized by this step's selections (not cumulative).
    pub reward: f64,
    /// True once the run has consumed the full planning horizon.
    pub done: bool,
}

/// Contract violations raised by `step`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("decision vector has {got} entries but {expected} projects are available")]
    DecisionLength { expected: usize, got: usize },
}

/// Output target for `render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Console,
}

/// Sequential project-selection environment.
pub struct ProjectEnv {
    cfg: SimConfig,
    horizon: usize,
    max_duration: usize,
    state: SimState,
    rng: RngBundle,
}

impl ProjectEnv {
    /// Build an environment from a validated configuration.
    ///
    /// A missing seed draws one from OS entropy; pass an explicit seed for
    /// reproducible runs.
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
        let state = Self::initial_state(&cfg, ledger_len);
        Ok(Self {
            cfg,
            horizon,
            max_duration,
            state,
            rng: RngBundle::from_user_seed(seed),
        })
    }

    fn initial_state(cfg: &SimConfig, ledger_len: usize) -> SimState {
        SimState {
            current_year: 0,
            project_id_counter: 0,
            cumulative_reward: 0.0,
            budgets: BudgetLedger::uniform(cfg.annual_budget, ledger_len),
            available_projects: Vec::new(),
            picked_project_ids: Vec::new(),
        }
    }

    /// Number of years the run executes before termination.
    #[must_use]
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Longest duration any generated project can have.
    #[must_use]
    pub const fn max_duration(&self) -> usize {
        self.max_duration
    }

    /// Read-only view of the current state.
    #[must_use]
    pub const fn state(&self) -> &SimState {
        &self.state
    }

    /// Mutable state access for harnesses that need to stage scenarios.
    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    /// Reinitialize counters and ledger and run one generation pass.
    ///
    /// The RNG streams are not re-seeded: resetting mid-run continues the
    /// bundle's sequences, exactly like starting a fresh draw from the same
    /// source.
    pub fn reset(&mut self) -> &SimState {
        self.state = Self::initial_state(&self.cfg, self.horizon + self.max_duration);
        self.generate_new_projects();
        log::debug!(
            "reset: {} projects available",
            self.state.available_projects.len()
        );
        &self.state
    }

    /// Apply one selection decision and advance the simulation by one year.
    ///
    /// `decision` holds one entry per available project, in the same order as
    /// `available_projects`. Selected projects are charged against the ledger
    /// and removed; rejected projects carry over with decayed value. Budgets
    /// are permitted to go negative: overspend is the policy's
    /// responsibility, never clamped here.
    ///
    /// # Errors
    ///
    /// Returns `ContractError::DecisionLength` (without mutating anything)
    /// when the decision vector length does not match the available set.
    pub fn step(&mut self, decision: &[bool]) -> Result<StepOutcome, ContractError> {
        let available = self.state.available_projects.len();
        if decision.len() != available {
            return Err(ContractError::DecisionLength {
                expected: available,
                got: decision.len(),
            });
        }

        let selection_year = self.state.current_year;
        let mut reward = 0.0;
        let mut carried = Vec::with_capacity(available);
        let projects = std::mem::take(&mut self.state.available_projects);
        for (project, &selected) in projects.iter().zip(decision) {
            if selected {
                self.state
                    .budgets
                    .apply_charges(selection_year, &project.cost_profile);
                reward += project.value;
                self.state.picked_project_ids.push(project.id);
            } else {
                carried.push(project.carried_over());
            }
        }
        self.state.cumulative_reward += reward;
        self.state.available_projects = carried;

        self.state.current_year += 1;
        let done = self.state.current_year >= self.horizon;

        if !done {
            self.generate_new_projects();
        }
        self.state
            .budgets
            .perturb_from(self.state.current_year, &mut *self.rng.budget());

        log::debug!(
            "year {} -> {}: reward {reward:.2}, {} projects now available",
            selection_year,
            self.state.current_year,
            self.state.available_projects.len()
        );
        Ok(StepOutcome { reward, done })
    }

    fn generate_new_projects(&mut self) {
        let mut rng = self.rng.generation();
        let new_projects = generate_projects(
            &self.cfg,
            self.max_duration,
            &mut self.state.project_id_counter,
            &mut *rng,
        );
        self.state.available_projects.extend(new_projects);
    }

    /// Dump the current state to an external sink. Diagnostic only; not part
    /// of the environment's testable contract.
    pub fn render(&self, mode: RenderMode, reward: f64) {
        match mode {
            RenderMode::Console => {
                let from = self.state.current_year.min(self.state.budgets.len());
                println!("Year: {}", self.state.current_year);
                println!("Reward: {reward}");
                println!("Cumulative reward: {}", self.state.cumulative_reward);
                println!("Budgets ahead: {:?}", &self.state.budgets.as_slice()[from..]);
                println!();
            }
        }
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
            num_slots: 5,
            slot_probability: 1.0,
            ..SimConfig::default_config()
        }
    }

    fn reject_all(env: &ProjectEnv) -> Vec<bool> {
        vec![false; env.state().available_projects.len()]
    }

    fn select_all(env: &ProjectEnv) -> Vec<bool> {
        vec![true; env.state().available_projects.len()]
    }

    #[test]
    fn ledger_spans_horizon_plus_max_duration() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        assert_eq!(env.state().budgets.len(), 5 + 7);
        env.reset();
        assert_eq!(env.state().budgets.len(), 5 + 7);
    }

    #[test]
    fn reset_runs_one_generation_pass() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        assert!(env.state().available_projects.is_empty());
        env.reset();
        assert_eq!(env.state().available_projects.len(), 5);
        assert_eq!(env.state().current_year, 0);
        assert_eq!(env.state().cumulative_reward, 0.0);
    }

    #[test]
    fn selecting_projects_deducts_current_year_budget() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let decision = select_all(&env);
        let outcome = env.step(&decision).unwrap();
        assert_eq!(env.state().current_year, 1);
        assert!(outcome.reward > 0.0);
        // Year 0 has elapsed, so the perturbation never revisits it and the
        // deduction is the only change.
        assert!(env.state().budgets.get(0).unwrap() < 55.0);
    }

    #[test]
    fn rejecting_everything_earns_nothing_and_keeps_budgets_near_par() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let decision = reject_all(&env);
        let outcome = env.step(&decision).unwrap();
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(env.state().cumulative_reward, 0.0);
        for budget in env.state().budgets.as_slice() {
            assert!((budget - 55.0).abs() <= 5.5 + 0.005);
        }
    }

    #[test]
    fn full_rejection_run_accumulates_no_reward() {
        let mut env = ProjectEnv::new(test_config(), Some(7)).unwrap();
        env.reset();
        let mut steps: i32 = 0;
        loop {
            let decision = reject_all(&env);
            let outcome = env.step(&decision).unwrap();
            steps += 1;
            if outcome.done {
                break;
            }
        }
        assert_eq!(steps as usize, env.horizon());
        assert_eq!(env.state().cumulative_reward, 0.0);
        // Each slot saw at most `steps` ±10% swings plus cent rounding.
        let ceiling = 55.0 * 1.1_f64.powi(steps) + 0.01 * f64::from(steps);
        let floor = 55.0 * 0.9_f64.powi(steps) - 0.01 * f64::from(steps);
        for budget in env.state().budgets.as_slice() {
            assert!((floor..=ceiling).contains(budget));
        }
    }

    #[test]
    fn rewards_accumulate_across_steps() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let mut total = 0.0;
        for _ in 0..2 {
            let decision = select_all(&env);
            total += env.step(&decision).unwrap().reward;
        }
        assert!((env.state().cumulative_reward - total).abs() < 1e-9);
    }

    #[test]
    fn rejected_projects_carry_over_with_decayed_values() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let before: Vec<(u64, f64)> = env
            .state()
            .available_projects
            .iter()
            .map(|p| (p.id, p.value))
            .collect();
        let decision = reject_all(&env);
        env.step(&decision).unwrap();
        // Carried projects keep their order at the front of the set; newly
        // generated ones are appended after them.
        assert!(env.state().available_projects.len() >= before.len());
        for ((id, value), project) in before.iter().zip(&env.state().available_projects) {
            assert_eq!(project.id, *id);
            assert!((project.value - value / 1.1).abs() < 1e-12);
        }
    }

    #[test]
    fn carried_projects_keep_cost_profiles_unshifted() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let before: Vec<_> = env
            .state()
            .available_projects
            .iter()
            .map(|p| p.cost_profile.clone())
            .collect();
        let decision = reject_all(&env);
        env.step(&decision).unwrap();
        for (profile, project) in before.iter().zip(&env.state().available_projects) {
            assert_eq!(&project.cost_profile, profile);
        }
    }

    #[test]
    fn unaffordable_selection_drives_budget_negative() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        env.state_mut().available_projects = vec![Project::new(
            999,
            300.0,
            smallvec![2000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )];
        env.step(&[true]).unwrap();
        assert!(env.state().budgets.get(0).unwrap() < 0.0);
        assert_eq!(env.state().picked_project_ids, vec![999]);
    }

    #[test]
    fn identical_seeds_replay_byte_identical_states() {
        let mut first = ProjectEnv::new(test_config(), Some(1234)).unwrap();
        let mut second = ProjectEnv::new(test_config(), Some(1234)).unwrap();
        first.reset();
        second.reset();
        for _ in 0..3 {
            let decision = reject_all(&first);
            first.step(&decision).unwrap();
            let decision = reject_all(&second);
            second.step(&decision).unwrap();
            let first_json = serde_json::to_string(first.state()).unwrap();
            let second_json = serde_json::to_string(second.state()).unwrap();
            assert_eq!(first_json, second_json);
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut first = ProjectEnv::new(test_config(), Some(1)).unwrap();
        let mut second = ProjectEnv::new(test_config(), Some(2)).unwrap();
        first.reset();
        second.reset();
        assert_ne!(
            serde_json::to_string(first.state()).unwrap(),
            serde_json::to_string(second.state()).unwrap()
        );
    }

    #[test]
    fn mismatched_decision_length_fails_without_mutating() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let snapshot = env.state().clone();
        let err = env.step(&[true]).unwrap_err();
        assert_eq!(
            err,
            ContractError::DecisionLength {
                expected: 5,
                got: 1
            }
        );
        assert_eq!(env.state(), &snapshot);
    }

    #[test]
    fn run_terminates_after_horizon_steps() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        for step in 0..env.horizon() {
            let decision = reject_all(&env);
            let outcome = env.step(&decision).unwrap();
            assert_eq!(outcome.done, step == env.horizon() - 1);
        }
        assert_eq!(env.state().current_year, env.horizon());
    }

    #[test]
    fn no_generation_after_terminal_step() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        loop {
            let decision = select_all(&env);
            if env.step(&decision).unwrap().done {
                break;
            }
        }
        assert!(env.state().available_projects.is_empty());
    }

    #[test]
    fn generation_appends_new_projects_each_year() {
        let mut env = ProjectEnv::new(test_config(), Some(42)).unwrap();
        env.reset();
        let decision = reject_all(&env);
        env.step(&decision).unwrap();
        assert_eq!(env.state().available_projects.len(), 10);
        assert_eq!(env.state().project_id_counter, 10);
    }
}
