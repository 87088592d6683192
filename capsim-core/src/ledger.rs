//! Year-indexed budget ledger.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::BUDGET_SWING_STEPS;
use crate::numbers::round2;

/// Remaining budget per simulated year, including the lookahead years that
/// absorb tail costs of projects selected near the end of the horizon.
///
/// Slots are indexed by absolute year number. Budgets are allowed to go
/// negative; an overrun is a valid post-condition, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetLedger(Vec<f64>);

impl BudgetLedger {
    /// A ledger with the same budget in every slot.
    #[must_use]
    pub fn uniform(annual_budget: f64, len: usize) -> Self {
        Self(vec![annual_budget; len])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, year: usize) -> Option<f64> {
        self.0.get(year).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Copy of the slots, for policy-local what-if deduction.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.clone()
    }

    /// Deduct a cost profile anchored at `start_year`. Offsets that fall
    /// outside the ledger are dropped.
    pub fn apply_charges(&mut self, start_year: usize, costs: &[f64]) {
        for (offset, cost) in costs.iter().enumerate() {
            if let Some(slot) = self.0.get_mut(start_year + offset) {
                *slot -= cost;
            }
        }
    }

    /// Apply one fresh ±10% swing to every slot from `from_year` onward,
    /// rounding each result to cents. Elapsed years are never touched.
    pub fn perturb_from<R: Rng + ?Sized>(&mut self, from_year: usize, rng: &mut R) {
        for slot in self.0.iter_mut().skip(from_year) {
            let step = rng.gen_range(0..BUDGET_SWING_STEPS);
            let swing = f64::from(step - BUDGET_SWING_STEPS / 2) / 100.0;
            *slot = round2(*slot * (1.0 + swing));
        }
    }
}

impl From<Vec<f64>> for BudgetLedger {
    fn from(slots: Vec<f64>) -> Self {
        Self(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_fills_every_slot() {
        let ledger = BudgetLedger::uniform(55.0, 4);
        assert_eq!(ledger.as_slice(), &[55.0, 55.0, 55.0, 55.0]);
    }

    #[test]
    fn charges_land_at_anchored_offsets() {
        let mut ledger = BudgetLedger::uniform(10.0, 5);
        ledger.apply_charges(2, &[1.0, 2.0]);
        assert_eq!(ledger.as_slice(), &[10.0, 10.0, 9.0, 8.0, 10.0]);
    }

    #[test]
    fn charges_past_the_ledger_are_dropped() {
        let mut ledger = BudgetLedger::uniform(10.0, 3);
        ledger.apply_charges(2, &[4.0, 6.0, 8.0]);
        assert_eq!(ledger.as_slice(), &[10.0, 10.0, 6.0]);
    }

    #[test]
    fn charges_may_drive_a_year_negative() {
        let mut ledger = BudgetLedger::uniform(5.0, 2);
        ledger.apply_charges(0, &[12.0]);
        assert_eq!(ledger.get(0), Some(-7.0));
    }

    #[test]
    fn perturbation_stays_within_ten_percent() {
        let mut rng = SmallRng::seed_from_u64(21);
        for _ in 0..64 {
            let mut ledger = BudgetLedger::uniform(80.0, 6);
            ledger.perturb_from(0, &mut rng);
            for slot in ledger.as_slice() {
                assert!((*slot - 80.0).abs() <= 8.0 + 0.005);
            }
        }
    }

    #[test]
    fn perturbation_skips_elapsed_years() {
        let mut rng = SmallRng::seed_from_u64(22);
        let mut ledger = BudgetLedger::uniform(80.0, 6);
        ledger.perturb_from(3, &mut rng);
        assert_eq!(&ledger.as_slice()[..3], &[80.0, 80.0, 80.0]);
    }

    #[test]
    fn perturbation_rounds_to_cents() {
        let mut rng = SmallRng::seed_from_u64(23);
        let mut ledger = BudgetLedger::uniform(33.33, 8);
        ledger.perturb_from(0, &mut rng);
        for slot in ledger.as_slice() {
            assert!(((slot * 100.0).round() / 100.0 - slot).abs() < f64::EPSILON);
        }
    }
}
