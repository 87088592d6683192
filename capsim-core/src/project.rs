//! Project records and cost profiling.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{COST_SCALE, VALUE_DECAY_DIVISOR};
use crate::numbers::round2;

/// Per-year cost allocation. Length is the run's maximum duration; entries
/// beyond a project's actual duration are zero.
pub type CostProfile = SmallVec<[f64; 8]>;

/// A candidate capital project.
///
/// Projects are immutable value records: carry-over produces a fresh record
/// with a decayed value instead of mutating one that other collections may
/// still reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique within a run, assigned in generation order.
    pub id: u64,
    /// Reward realized if the project is selected.
    pub value: f64,
    /// Cost due at each year offset from the year of selection.
    pub cost_profile: CostProfile,
}

impl Project {
    #[must_use]
    pub fn new(id: u64, value: f64, cost_profile: CostProfile) -> Self {
        Self {
            id,
            value,
            cost_profile,
        }
    }

    /// Total cost across every year of the profile.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.cost_profile.iter().sum()
    }

    /// The record this project becomes after one unselected year.
    #[must_use]
    pub fn carried_over(&self) -> Self {
        Self {
            id: self.id,
            value: self.value / VALUE_DECAY_DIVISOR,
            cost_profile: self.cost_profile.clone(),
        }
    }
}

/// Spend curves for the durations with bespoke allocations. Roughly
/// bell-shaped; each row sums to 1.0.
fn spend_curve(duration: usize) -> Option<&'static [f64]> {
    match duration {
        5 => Some(&[0.1, 0.2, 0.4, 0.2, 0.1]),
        6 => Some(&[0.05, 0.15, 0.3, 0.3, 0.15, 0.05]),
        7 => Some(&[0.05, 0.1, 0.2, 0.3, 0.2, 0.1, 0.05]),
        _ => None,
    }
}

/// Allocate a total cost across `duration` years and right-pad with zeros out
/// to `max_duration` slots. Durations without a bespoke spend curve fall back
/// to an equal split.
#[must_use]
pub fn build_cost_profile(total_cost: f64, duration: usize, max_duration: usize) -> CostProfile {
    let mut profile: CostProfile = match spend_curve(duration) {
        Some(curve) => curve
            .iter()
            .map(|share| round2(total_cost * share))
            .collect(),
        None => {
            let even = round2(total_cost / duration as f64);
            (0..duration).map(|_| even).collect()
        }
    };
    if profile.len() < max_duration {
        profile.resize(max_duration, 0.0);
    }
    profile
}

/// Convert a raw dollar cost sample into ledger units.
#[must_use]
pub(crate) fn scale_cost(raw: f64) -> f64 {
    round2(raw / COST_SCALE)
}
