//! Single-episode driver: one environment, one policy, run to termination.

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use capsim_core::{PolicyKind, ProjectEnv, RenderMode, SelectionPolicy, SimConfig};

/// Summary of one completed episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeOutcome {
    pub policy: String,
    pub seed: u64,
    pub annual_budget: f64,
    pub cumulative_reward: f64,
    pub picked_projects: usize,
    pub steps: usize,
    #[serde(serialize_with = "serialize_duration_secs")]
    pub duration: Duration,
}

fn serialize_duration_secs<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Run one full episode of `cfg` under the given policy and seed.
///
/// The policy reads each state snapshot and returns a decision vector; the
/// environment applies it. Neither side ever reaches into the other.
pub fn run_episode(
    cfg: &SimConfig,
    kind: PolicyKind,
    seed: u64,
    render: bool,
) -> Result<EpisodeOutcome> {
    let policy = kind.create();
    let mut env = ProjectEnv::new(cfg.clone(), Some(seed))?;
    let horizon = env.horizon();
    let started = Instant::now();

    env.reset();
    let mut steps = 0;
    loop {
        let decision = policy.solve(env.state(), horizon);
        let outcome = env.step(&decision)?;
        steps += 1;
        if render {
            env.render(RenderMode::Console, outcome.reward);
        }
        if outcome.done {
            break;
        }
    }

    log::info!(
        "{}: seed {seed} budget {} -> reward {:.2}",
        kind.label(),
        cfg.annual_budget,
        env.state().cumulative_reward
    );
    Ok(EpisodeOutcome {
        policy: kind.label().to_string(),
        seed,
        annual_budget: cfg.annual_budget,
        cumulative_reward: env.state().cumulative_reward,
        picked_projects: env.state().picked_project_ids.len(),
        steps,
        duration: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimConfig {
        SimConfig {
            years: 3,
            annual_budget: 40.0,
            num_slots: 3,
            slot_probability: 0.8,
            ..SimConfig::default_config()
        }
    }

    #[test]
    fn episode_runs_the_full_horizon() {
        let outcome = run_episode(&small_config(), PolicyKind::GreedyRatio, 42, false).unwrap();
        assert_eq!(outcome.steps, 3);
        assert_eq!(outcome.policy, "greedy-ratio");
        assert!(outcome.cumulative_reward >= 0.0);
    }

    #[test]
    fn episodes_are_reproducible_per_seed() {
        let first = run_episode(&small_config(), PolicyKind::Myopic, 7, false).unwrap();
        let second = run_episode(&small_config(), PolicyKind::Myopic, 7, false).unwrap();
        assert_eq!(first.cumulative_reward, second.cumulative_reward);
        assert_eq!(first.picked_projects, second.picked_projects);
    }

    #[test]
    fn different_policies_share_the_same_arrivals() {
        // Same seed, different policies: generation is policy-independent, so
        // both run against identical project streams.
        let greedy = run_episode(&small_config(), PolicyKind::GreedyValue, 11, false).unwrap();
        let myopic = run_episode(&small_config(), PolicyKind::Myopic, 11, false).unwrap();
        assert_eq!(greedy.steps, myopic.steps);
    }
}
