//! Stochastic project generation.

use rand::Rng;

use crate::config::SimConfig;
use crate::project::{build_cost_profile, scale_cost, Project};
use crate::rng::{sample_triangular, sample_weighted};

/// Run one generation pass: each configured slot independently produces a
/// project with the configured probability.
///
/// Ids are taken from `next_id` in generation order; the counter advances
/// once per materialized project and never repeats within a run.
pub(crate) fn generate_projects<R: Rng + ?Sized>(
    cfg: &SimConfig,
    max_duration: usize,
    next_id: &mut u64,
    rng: &mut R,
) -> Vec<Project> {
    let mut projects = Vec::new();
    for _ in 0..cfg.num_slots {
        if rng.gen::<f64>() >= cfg.slot_probability {
            continue;
        }
        let id = *next_id;
        *next_id += 1;

        let value = cfg.project_values[sample_weighted(&cfg.project_probabilities, rng)];
        let duration =
            cfg.project_duration_choices[sample_weighted(&cfg.project_duration_probabilities, rng)];
        let total_cost = scale_cost(sample_triangular(
            cfg.minimum_cost,
            cfg.average_cost,
            cfg.maximum_cost,
            rng,
        ));
        projects.push(Project::new(
            id,
            value,
            build_cost_profile(total_cost, duration, max_duration),
        ));
    }
    projects
}
