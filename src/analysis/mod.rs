//! Sampling and aggregation engine.
//!
//! A run samples identifiers from the store, then fetches, classifies and
//! accumulates one profile at a time.

pub mod aggregator;
pub mod classifier;
pub mod sampler;

pub use aggregator::Aggregator;
pub use classifier::{classify, unfixed_breakdown};
pub use sampler::{SampleStrategy, Sampler};

use crate::error::Result;
use crate::models::{MetricDistribution, SampleResult, SystemReport};
use crate::store::ProfileStore;
use tracing::debug;

/// What to keep beyond the totals and averages.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Keep one [`SystemReport`] per sampled system.
    pub per_system: bool,
    /// Compute per-metric distributions.
    pub describe: bool,
}

/// Outcome of one sampling run.
#[derive(Debug, Clone)]
pub struct SampleRun {
    pub population: u64,
    pub result: SampleResult,
    pub systems: Vec<SystemReport>,
    pub distribution: Option<Vec<MetricDistribution>>,
}

/// Sample `requested` systems from `store` and aggregate them.
///
/// `on_sampled` receives the final sample size before any profile is read;
/// `on_system` is called after each system is classified. Any malformed
/// profile aborts the whole run.
pub fn run_sample<S, F, G>(
    store: &S,
    sampler: &Sampler,
    requested: u64,
    options: RunOptions,
    on_sampled: F,
    mut on_system: G,
) -> Result<SampleRun>
where
    S: ProfileStore + ?Sized,
    F: FnOnce(u64),
    G: FnMut(&SystemReport),
{
    let sample = sampler.sample(store, requested)?;
    on_sampled(sample.ids.len() as u64);

    let mut aggregator = if options.describe {
        Aggregator::with_distribution()
    } else {
        Aggregator::new()
    };
    let mut systems = Vec::new();

    for id in &sample.ids {
        let profile = store.fetch(id)?;
        let counts = classify(&profile)?;
        aggregator.add(counts);

        let report = SystemReport {
            id: profile.id.clone(),
            repositories: profile.rhel_repositories(),
            counts,
            unfixed_breakdown: unfixed_breakdown(&profile),
        };
        debug!("{}: {:?}", report.id, report.counts);
        on_system(&report);

        if options.per_system {
            systems.push(report);
        }
    }

    let result = aggregator.finish()?;
    let distribution = aggregator.distribution().transpose()?;

    Ok(SampleRun {
        population: sample.population,
        result,
        systems,
        distribution,
    })
}
