//! capsim experiment CLI.
//!
//! Three modes: `run` drives one rendered episode, `batch` sweeps budgets x
//! seeds x policies across worker threads, and `oracle` computes the offline
//! upper bound for the same budget sweep.

mod batch;
mod episode;
mod reports;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use capsim_core::{solve_oracle, OfflineEnv, PolicyKind, SimConfig};

use batch::{parse_budget_range, run_batch, seed_batch, BatchPlan};
use episode::run_episode;
use reports::{print_console_report, summarize, write_json_report};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Greedy on value per unit of total cost
    GreedyRatio,
    /// Greedy on raw value
    GreedyValue,
    /// Myopic knapsack over known projects and budgets
    Myopic,
    /// Myopic knapsack withholding a share of future budgets
    AlphaMyopic,
}

impl PolicyArg {
    const fn to_kind(self, alpha: f64) -> PolicyKind {
        match self {
            Self::GreedyRatio => PolicyKind::GreedyRatio,
            Self::GreedyValue => PolicyKind::GreedyValue,
            Self::Myopic => PolicyKind::Myopic,
            Self::AlphaMyopic => PolicyKind::AlphaMyopic { alpha },
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "capsim-tester", version)]
#[command(about = "Experiment driver for the capsim project-selection engine")]
struct Args {
    /// JSON file with run parameters; defaults to the built-in configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one episode and dump the state after every step
    Run {
        #[arg(long, value_enum, default_value_t = PolicyArg::AlphaMyopic)]
        policy: PolicyArg,
        /// Withheld share of future budgets for the alpha-myopic policy
        #[arg(long, default_value_t = 0.4)]
        alpha: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Suppress the per-step console dump
        #[arg(long)]
        quiet: bool,
    },
    /// Sweep budgets x seeds x policies across worker threads
    Batch {
        /// Budget sweep as start:end:step (end exclusive)
        #[arg(long, default_value = "50:160:10")]
        budgets: String,
        /// Base seed; per-run seeds derive from it
        #[arg(long, default_value_t = 1337)]
        seed: u64,
        /// Episodes per (budget, policy) cell
        #[arg(long, default_value_t = 5)]
        runs: usize,
        #[arg(long, default_value_t = 0.4)]
        alpha: f64,
        /// Worker threads; defaults to the available parallelism
        #[arg(long)]
        threads: Option<usize>,
        /// Write outcomes and aggregates to this JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Offline oracle benchmark over a budget sweep
    Oracle {
        #[arg(long, default_value = "50:160:10")]
        budgets: String,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Wall-clock limit per solve, in seconds
        #[arg(long, default_value_t = 60)]
        time_limit: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = load_config(args.config.as_deref())?;

    match args.command {
        Command::Run {
            policy,
            alpha,
            seed,
            quiet,
        } => run_single(&cfg, policy.to_kind(alpha), seed, !quiet),
        Command::Batch {
            budgets,
            seed,
            runs,
            alpha,
            threads,
            out,
        } => run_batch_command(&cfg, &budgets, seed, runs, alpha, threads, out.as_deref()),
        Command::Oracle {
            budgets,
            seed,
            time_limit,
        } => run_oracle(&cfg, &budgets, seed, Duration::from_secs(time_limit)),
    }
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(SimConfig::from_json(&raw)?)
        }
        None => Ok(SimConfig::default_config()),
    }
}

fn run_single(cfg: &SimConfig, kind: PolicyKind, seed: u64, render: bool) -> Result<()> {
    let outcome = run_episode(cfg, kind, seed, render)?;
    println!(
        "{} finished: cumulative reward {} over {} steps ({} projects funded)",
        outcome.policy.bright_white().bold(),
        format!("{:.2}", outcome.cumulative_reward).green(),
        outcome.steps,
        outcome.picked_projects
    );
    Ok(())
}

fn run_batch_command(
    cfg: &SimConfig,
    budgets: &str,
    seed: u64,
    runs: usize,
    alpha: f64,
    threads: Option<usize>,
    out: Option<&Path>,
) -> Result<()> {
    let threads = threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
    });
    let plan = BatchPlan {
        budgets: parse_budget_range(budgets)?,
        seeds: seed_batch(seed, runs),
        policies: vec![
            PolicyKind::GreedyRatio,
            PolicyKind::GreedyValue,
            PolicyKind::Myopic,
            PolicyKind::AlphaMyopic { alpha },
        ],
        threads,
    };
    let outcomes = run_batch(cfg, &plan)?;
    let summaries = summarize(&outcomes);
    print_console_report(&summaries);
    if let Some(path) = out {
        write_json_report(path, &outcomes, &summaries)?;
    }
    Ok(())
}

fn run_oracle(cfg: &SimConfig, budgets: &str, seed: u64, time_limit: Duration) -> Result<()> {
    println!();
    println!("{}", "Offline oracle benchmark".bright_cyan().bold());
    println!("{}", "========================".cyan());
    for budget in parse_budget_range(budgets)? {
        let run_cfg = SimConfig {
            annual_budget: budget,
            ..cfg.clone()
        };
        let mut env = OfflineEnv::new(run_cfg, Some(seed))?;
        let pool = env.run_and_collect();
        let ledger = env.state().budgets.to_vec();
        let solution = solve_oracle(&pool, &ledger, Some(time_limit));
        let funded = solution.selection.iter().filter(|s| **s).count();
        let marker = if solution.optimality.is_proven() {
            String::new()
        } else {
            format!(" {}", "(time limit)".yellow())
        };
        println!(
            "budget {:>6.1}: upper bound {:>10.2} ({} of {} opportunities){}",
            budget,
            solution.total_value,
            funded,
            pool.len(),
            marker
        );
    }
    println!();
    Ok(())
}
