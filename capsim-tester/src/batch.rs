//! Batch experiment runner.
//!
//! Sweeps budgets x seeds x policies. Each worker thread owns its
//! environments and policies outright; the only shared data is the immutable
//! base configuration, so workers never contend on state.

use anyhow::{bail, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::thread;

use capsim_core::{PolicyKind, SimConfig};

use crate::episode::{run_episode, EpisodeOutcome};

/// One full sweep description.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub budgets: Vec<f64>,
    pub seeds: Vec<u64>,
    pub policies: Vec<PolicyKind>,
    pub threads: usize,
}

/// Parse a `start:end:step` budget sweep (end exclusive).
pub fn parse_budget_range(range: &str) -> Result<Vec<f64>> {
    let parts: Vec<&str> = range.split(':').collect();
    let [start, end, step] = parts.as_slice() else {
        bail!("budget range must be start:end:step (got {range})");
    };
    let start: f64 = start.parse()?;
    let end: f64 = end.parse()?;
    let step: f64 = step.parse()?;
    if step <= 0.0 {
        bail!("budget step must be positive (got {step})");
    }
    let mut budgets = Vec::new();
    let mut current = start;
    while current < end {
        budgets.push(current);
        current += step;
    }
    if budgets.is_empty() {
        bail!("budget range {range} is empty");
    }
    Ok(budgets)
}

/// Derive `count` independent run seeds from one base seed.
pub fn seed_batch(base_seed: u64, count: usize) -> Vec<u64> {
    let mut rng = ChaCha20Rng::seed_from_u64(base_seed);
    (0..count).map(|_| rng.gen()).collect()
}

/// Run every (budget, seed, policy) combination and return the outcomes in a
/// deterministic order regardless of worker scheduling.
pub fn run_batch(cfg: &SimConfig, plan: &BatchPlan) -> Result<Vec<EpisodeOutcome>> {
    let mut jobs: Vec<(f64, u64, PolicyKind)> = Vec::new();
    for &budget in &plan.budgets {
        for &seed in &plan.seeds {
            for &policy in &plan.policies {
                jobs.push((budget, seed, policy));
            }
        }
    }
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let workers = plan.threads.clamp(1, jobs.len());
    let chunk_size = jobs.len().div_ceil(workers);
    log::info!("running {} episodes on {workers} workers", jobs.len());

    let mut results: Vec<EpisodeOutcome> = Vec::with_capacity(jobs.len());
    thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::new();
        for chunk in jobs.chunks(chunk_size) {
            handles.push(scope.spawn(move || -> Result<Vec<EpisodeOutcome>> {
                let mut outcomes = Vec::with_capacity(chunk.len());
                for &(budget, seed, policy) in chunk {
                    let run_cfg = SimConfig {
                        annual_budget: budget,
                        ..cfg.clone()
                    };
                    outcomes.push(run_episode(&run_cfg, policy, seed, false)?);
                }
                Ok(outcomes)
            }));
        }
        for handle in handles {
            match handle.join() {
                Ok(outcomes) => results.extend(outcomes?),
                Err(_) => bail!("batch worker panicked"),
            }
        }
        Ok(())
    })?;

    results.sort_by(|a, b| {
        a.policy
            .cmp(&b.policy)
            .then(a.annual_budget.total_cmp(&b.annual_budget))
            .then(a.seed.cmp(&b.seed))
    });
    Ok(results)
}
