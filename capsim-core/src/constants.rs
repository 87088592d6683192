//! Domain constants shared across the engine.

/// Divisor applied to a project's value for every year it is carried over
/// unselected.
pub const VALUE_DECAY_DIVISOR: f64 = 1.1;

/// Raw sampled costs are drawn in dollars; ledgers are kept in millions.
pub const COST_SCALE: f64 = 1_000_000.0;

/// Weight of the total-cost term in knapsack objectives. Small enough that it
/// only breaks ties between equal-value selections, never overrides a value
/// difference.
pub const COST_WEIGHT: f64 = 1e-4;

/// Year-over-year budget swings are drawn from {-10%, ..., +10%} in 1% steps.
pub const BUDGET_SWING_STEPS: i32 = 21;

/// Absolute slack for floating-point budget comparisons.
pub const BUDGET_EPSILON: f64 = 1e-9;
