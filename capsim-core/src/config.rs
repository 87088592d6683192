//! Run configuration and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance applied when checking that a probability vector sums to 1.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Immutable per-run parameters for a simulation.
///
/// Budgets and costs are expressed in millions except for the triangular
/// cost-distribution parameters, which are drawn in dollars and scaled down
/// during generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Planning horizon in years.
    pub years: usize,
    /// Budget allotted to every ledger year at the start of a run.
    pub annual_budget: f64,
    /// Number of project slots that may fill each year.
    pub num_slots: usize,
    /// Probability that any single slot produces a project.
    pub slot_probability: f64,
    /// Discrete project values.
    pub project_values: Vec<f64>,
    /// Probability of each project value.
    pub project_probabilities: Vec<f64>,
    /// Discrete project durations, in years.
    pub project_duration_choices: Vec<usize>,
    /// Probability of each project duration.
    pub project_duration_probabilities: Vec<f64>,
    /// Lower bound of the triangular total-cost distribution, in dollars.
    pub minimum_cost: f64,
    /// Mode of the triangular total-cost distribution, in dollars.
    pub average_cost: f64,
    /// Upper bound of the triangular total-cost distribution, in dollars.
    pub maximum_cost: f64,
}

impl SimConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or validation fails.
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The canonical experiment parameters used by the reference runs.
    #[must_use]
    pub fn default_config() -> Self {
        Self {
            years: 25,
            annual_budget: 80.0,
            num_slots: 20,
            slot_probability: 0.5,
            project_values: vec![1.0, 10.0, 100.0],
            project_probabilities: vec![0.50, 0.35, 0.15],
            project_duration_choices: vec![5, 6, 7],
            project_duration_probabilities: vec![0.25, 0.5, 0.25],
            minimum_cost: 1_200_000.0,
            average_cost: 25_706_000.0,
            maximum_cost: 85_015_000.0,
        }
    }

    /// Longest duration any generated project can have.
    ///
    /// # Panics
    ///
    /// Panics if the duration choice list is empty; `validate` rejects such
    /// configurations before an environment is built.
    #[must_use]
    pub fn max_duration(&self) -> usize {
        *self
            .project_duration_choices
            .iter()
            .max()
            .expect("duration choices validated non-empty")
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first violated invariant. Nothing
    /// is silently defaulted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.num_slots == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        if !(0.0..=1.0).contains(&self.slot_probability) {
            return Err(ConfigError::ProbabilityRange {
                field: "slot_probability",
                value: self.slot_probability,
            });
        }
        Self::validate_distribution(
            "project_values",
            self.project_values.len(),
            "project_probabilities",
            &self.project_probabilities,
        )?;
        Self::validate_distribution(
            "project_duration_choices",
            self.project_duration_choices.len(),
            "project_duration_probabilities",
            &self.project_duration_probabilities,
        )?;
        if self.project_duration_choices.iter().any(|&d| d == 0) {
            return Err(ConfigError::ZeroDuration);
        }
        self.validate_costs()?;
        Ok(())
    }

    fn validate_distribution(
        choices_field: &'static str,
        choices_len: usize,
        probabilities_field: &'static str,
        probabilities: &[f64],
    ) -> Result<(), ConfigError> {
        if choices_len == 0 {
            return Err(ConfigError::EmptyDistribution {
                field: choices_field,
            });
        }
        if probabilities.len() != choices_len {
            return Err(ConfigError::LengthMismatch {
                choices: choices_field,
                probabilities: probabilities_field,
                expected: choices_len,
                got: probabilities.len(),
            });
        }
        for &probability in probabilities {
            if !(0.0..=1.0).contains(&probability) {
                return Err(ConfigError::ProbabilityRange {
                    field: probabilities_field,
                    value: probability,
                });
            }
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ConfigError::ProbabilitySum {
                field: probabilities_field,
                sum,
            });
        }
        Ok(())
    }

    fn validate_costs(&self) -> Result<(), ConfigError> {
        if self.minimum_cost <= 0.0 {
            return Err(ConfigError::NonPositiveCost {
                field: "minimum_cost",
                value: self.minimum_cost,
            });
        }
        if !(self.minimum_cost <= self.average_cost && self.average_cost <= self.maximum_cost) {
            return Err(ConfigError::CostOrdering {
                minimum: self.minimum_cost,
                average: self.average_cost,
                maximum: self.maximum_cost,
            });
        }
        Ok(())
    }
}

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("configuration is not valid JSON: {0}")]
    Parse(String),
    #[error("years must be at least 1")]
    ZeroHorizon,
    #[error("num_slots must be at least 1")]
    ZeroSlots,
    #[error("project durations must be at least 1 year")]
    ZeroDuration,
    #[error("{field} must not be empty")]
    EmptyDistribution { field: &'static str },
    #[error("{probabilities} has {got} entries but {choices} has {expected}")]
    LengthMismatch {
        choices: &'static str,
        probabilities: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{field} must be between 0 and 1 (got {value})")]
    ProbabilityRange { field: &'static str, value: f64 },
    #[error("{field} must sum to 1 (got {sum})")]
    ProbabilitySum { field: &'static str, sum: f64 },
    #[error("{field} must be positive (got {value})")]
    NonPositiveCost { field: &'static str, value: f64 },
    #[error("cost bounds must be ordered: minimum {minimum} <= average {average} <= maximum {maximum}")]
    CostOrdering {
        minimum: f64,
        average: f64,
        maximum: f64,
    },
}
