//! Experiment reporting: console tables and JSON artifacts.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use crate::episode::EpisodeOutcome;

/// Aggregate of every run sharing a policy and annual budget.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyBudgetSummary {
    pub policy: String,
    pub annual_budget: f64,
    pub runs: usize,
    pub mean_reward: f64,
    pub min_reward: f64,
    pub max_reward: f64,
}

/// Group outcomes by (policy, budget) and aggregate their rewards.
pub fn summarize(outcomes: &[EpisodeOutcome]) -> Vec<PolicyBudgetSummary> {
    let mut groups: BTreeMap<(String, i64), Vec<f64>> = BTreeMap::new();
    for outcome in outcomes {
        let budget_cents = (outcome.annual_budget * 100.0).round() as i64;
        groups
            .entry((outcome.policy.clone(), budget_cents))
            .or_default()
            .push(outcome.cumulative_reward);
    }
    groups
        .into_iter()
        .map(|((policy, budget_cents), rewards)| {
            let mean = rewards.iter().sum::<f64>() / rewards.len() as f64;
            let min = rewards.iter().copied().fold(f64::INFINITY, f64::min);
            let max = rewards.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            PolicyBudgetSummary {
                policy,
                annual_budget: budget_cents as f64 / 100.0,
                runs: rewards.len(),
                mean_reward: mean,
                min_reward: min,
                max_reward: max,
            }
        })
        .collect()
}

/// Print the aggregate table to the console.
pub fn print_console_report(summaries: &[PolicyBudgetSummary]) {
    println!();
    println!("{}", "Batch results".bright_cyan().bold());
    println!("{}", "=============".cyan());
    println!(
        "{:<18} {:>8} {:>6} {:>12} {:>12} {:>12}",
        "policy", "budget", "runs", "mean", "min", "max"
    );
    for summary in summaries {
        println!(
            "{:<18} {:>8.1} {:>6} {:>12.2} {:>12.2} {:>12.2}",
            summary.policy.green(),
            summary.annual_budget,
            summary.runs,
            summary.mean_reward,
            summary.min_reward,
            summary.max_reward
        );
    }
    println!();
}

/// Write outcomes and their aggregates to a JSON file.
pub fn write_json_report(
    path: &Path,
    outcomes: &[EpisodeOutcome],
    summaries: &[PolicyBudgetSummary],
) -> Result<()> {
    #[derive(Serialize)]
    struct Report<'a> {
        outcomes: &'a [EpisodeOutcome],
        summaries: &'a [PolicyBudgetSummary],
    }

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(
        BufWriter::new(file),
        &Report {
            outcomes,
            summaries,
        },
    )?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outcome(policy: &str, budget: f64, reward: f64) -> EpisodeOutcome {
        EpisodeOutcome {
            policy: policy.to_string(),
            seed: 1,
            annual_budget: budget,
            cumulative_reward: reward,
            picked_projects: 0,
            steps: 0,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn summaries_group_by_policy_and_budget() {
        let outcomes = vec![
            outcome("greedy-ratio", 50.0, 10.0),
            outcome("greedy-ratio", 50.0, 20.0),
            outcome("greedy-ratio", 60.0, 30.0),
            outcome("myopic-knapsack", 50.0, 40.0),
        ];
        let summaries = summarize(&outcomes);
        assert_eq!(summaries.len(), 3);
        let first = &summaries[0];
        assert_eq!(first.policy, "greedy-ratio");
        assert_eq!(first.runs, 2);
        assert!((first.mean_reward - 15.0).abs() < 1e-9);
        assert_eq!(first.min_reward, 10.0);
        assert_eq!(first.max_reward, 20.0);
    }

    #[test]
    fn empty_outcomes_summarize_to_nothing() {
        assert!(summarize(&[]).is_empty());
    }
}
