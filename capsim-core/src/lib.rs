//! capsim core engine
//!
//! Year-over-year capital-project selection: stochastic project arrivals with
//! multi-year cost profiles, a perturbed budget ledger, and the
//! budget-constrained policies (greedy heuristics and knapsack solves) that
//! decide what to fund each year. Platform-agnostic library logic only; the
//! experiment CLI lives in `capsim-tester`.

pub mod config;
pub mod constants;
pub mod env;
pub mod ledger;
pub mod numbers;
pub mod offline;
pub mod policy;
pub mod project;
pub mod rng;
pub mod solver;

mod generator;

// Re-export commonly used types
pub use config::{ConfigError, SimConfig};
pub use env::{ContractError, ProjectEnv, RenderMode, SimState, StepOutcome};
pub use ledger::BudgetLedger;
pub use offline::{solve_oracle, OfflineEnv, OracleSolution};
pub use policy::{
    AlphaMyopic, GreedyRatio, GreedyValue, MyopicKnapsack, PolicyKind, SelectionPolicy,
};
pub use project::{build_cost_profile, CostProfile, Project};
pub use rng::RngBundle;
pub use solver::{BinaryProgram, Optimality, RowKey, Solution};
