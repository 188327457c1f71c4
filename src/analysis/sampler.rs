//! Random selection of systems from the profile store.

use crate::error::{Result, SampleError};
use crate::models::SystemId;
use crate::store::ProfileStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// How the sample is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SampleStrategy {
    /// The store's own random ordering (`ORDER BY RANDOM() LIMIT n`).
    #[default]
    Native,
    /// Reservoir sampling over an identifier cursor; reproducible with a seed.
    Reservoir,
}

impl fmt::Display for SampleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleStrategy::Native => write!(f, "native"),
            SampleStrategy::Reservoir => write!(f, "reservoir"),
        }
    }
}

/// Identifiers chosen for one run.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Evaluated systems in the store at sampling time.
    pub population: u64,
    /// Distinct identifiers, sorted.
    pub ids: Vec<SystemId>,
}

/// Draws uniformly random samples without replacement.
///
/// A request larger than the population is capped to the whole population.
#[derive(Debug, Clone)]
pub struct Sampler {
    strategy: SampleStrategy,
    seed: Option<u64>,
}

impl Sampler {
    pub fn new(strategy: SampleStrategy, seed: Option<u64>) -> Self {
        Self { strategy, seed }
    }

    pub fn strategy(&self) -> SampleStrategy {
        self.strategy
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Select `requested` distinct systems from `store`.
    pub fn sample<S: ProfileStore + ?Sized>(&self, store: &S, requested: u64) -> Result<Sample> {
        if requested == 0 {
            return Err(SampleError::InvalidSampleSize(requested));
        }

        let population = store.population()?;
        if population == 0 {
            return Err(SampleError::EmptyPopulation);
        }

        let size = if requested > population {
            warn!(
                "Requested {} systems but only {} are available; sampling all of them",
                requested, population
            );
            population
        } else {
            requested
        };

        let mut ids = match self.strategy {
            SampleStrategy::Native => store.random_ids(size)?,
            SampleStrategy::Reservoir => self.reservoir(store, size)?,
        };
        ids.sort();
        ids.dedup();

        debug!(
            "Sampled {} of {} systems using {} strategy",
            ids.len(),
            population,
            self.strategy
        );

        Ok(Sample { population, ids })
    }

    /// Algorithm R over the store's identifier cursor.
    fn reservoir<S: ProfileStore + ?Sized>(&self, store: &S, size: u64) -> Result<Vec<SystemId>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let capacity = usize::try_from(size).unwrap_or(usize::MAX);
        let mut reservoir: Vec<SystemId> = Vec::new();
        let mut seen: u64 = 0;

        store.for_each_id(&mut |id| {
            if reservoir.len() < capacity {
                reservoir.push(id);
            } else {
                let slot = rng.gen_range(0..=seen);
                if slot < size {
                    reservoir[slot as usize] = id;
                }
            }
            seen += 1;
        })?;

        Ok(reservoir)
    }
}
