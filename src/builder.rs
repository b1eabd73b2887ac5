//! Builder pattern for generating full-factorial runs.
//!
//! The builder enumerates every combination of the factors' declared levels
//! and produces one [`Run`] per combination and replicate, ready to be
//! attached to an [`Experiment`](crate::experiment::Experiment).
//!
//! # Example
//!
//! ```
//! use doe_engine::FullFactorialBuilder;
//! use doe_engine::experiment::Factor;
//!
//! let factors = vec![
//!     Factor::quantitative(1, "Temperature", "T", &[150.0, 175.0, 200.0]),
//!     Factor::categorical(2, "Material", "M", &["steel", "brass"]),
//! ];
//! let runs = FullFactorialBuilder::new()
//!     .factors(&factors)
//!     .replicates(2)
//!     .randomize(42)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(runs.len(), 12);      // 3 × 2 combinations, 2 replicates
//! assert!(runs[0].factor_values.contains_key(&1));
//! ```
//!
//! # Ordering
//!
//! - **Standard order** follows the Cartesian product with the first factor
//!   varying slowest; replicates of a combination are adjacent.
//! - **Run order** is a permutation of `1..=N`, shuffled by a seeded RNG when
//!   [`FullFactorialBuilder::randomize`] is set and equal to the standard
//!   order otherwise.
//! - A run is a **center point** when every quantitative factor sits at the
//!   middle level of an odd-length level list. With no quantitative factor
//!   every run qualifies.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::experiment::{Factor, Level, Run};

/// Builder for full-factorial run lists.
#[derive(Debug, Clone)]
pub struct FullFactorialBuilder {
    factors: Vec<Factor>,
    replicates: u32,
    seed: Option<u64>,
}

impl Default for FullFactorialBuilder {
    fn default() -> Self {
        Self {
            factors: Vec::new(),
            replicates: 1,
            seed: None,
        }
    }
}

impl FullFactorialBuilder {
    /// Create a new builder with one replicate and no randomization.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the factors. Their declared levels define the design.
    #[must_use]
    pub fn factors(mut self, factors: &[Factor]) -> Self {
        self.factors = factors.to_vec();
        self
    }

    /// Set the number of replicates per combination.
    #[must_use]
    pub fn replicates(mut self, replicates: u32) -> Self {
        self.replicates = replicates;
        self
    }

    /// Shuffle the run order with a seeded RNG.
    #[must_use]
    pub fn randomize(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of runs the builder will produce, without building.
    #[must_use]
    pub fn num_runs(&self) -> usize {
        self.factors
            .iter()
            .map(|f| f.levels.len())
            .product::<usize>()
            .saturating_mul(self.replicates as usize)
    }

    /// Build the runs in standard order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFactors`] without factors and
    /// [`Error::InvalidParams`] when a factor has no declared level or the
    /// replicate count is zero.
    pub fn build(self) -> Result<Vec<Run>> {
        if self.factors.is_empty() {
            return Err(Error::NoFactors);
        }
        if let Some(f) = self.factors.iter().find(|f| f.levels.is_empty()) {
            return Err(Error::invalid_params(format!(
                "factor '{}' has no levels",
                f.symbol
            )));
        }
        if self.replicates == 0 {
            return Err(Error::invalid_params("replicates must be at least 1"));
        }

        let combinations = cartesian_product(&self.factors);
        let total = combinations.len() * self.replicates as usize;

        let mut run_orders: Vec<i64> = (1..=total as i64).collect();
        if let Some(seed) = self.seed {
            let mut rng = StdRng::seed_from_u64(seed);
            run_orders.shuffle(&mut rng);
        }

        let mut runs = Vec::with_capacity(total);
        for combination in &combinations {
            let is_center_point = is_center(&self.factors, combination);
            for replicate in 1..=self.replicates {
                let index = runs.len();
                let mut run = Run::new(index as i64 + 1, run_orders[index]);
                run.replicate = replicate;
                run.is_center_point = is_center_point;
                for (factor, level) in self.factors.iter().zip(combination) {
                    run.factor_values.insert(factor.id, level.clone());
                }
                runs.push(run);
            }
        }

        debug!(
            factors = self.factors.len(),
            combinations = combinations.len(),
            runs = runs.len(),
            randomized = self.seed.is_some(),
            "generated full-factorial runs"
        );
        Ok(runs)
    }
}

/// Every combination of declared levels, first factor varying slowest.
fn cartesian_product(factors: &[Factor]) -> Vec<Vec<Level>> {
    factors.iter().fold(vec![Vec::new()], |acc, factor| {
        acc.into_iter()
            .flat_map(|prefix| {
                factor.levels.iter().map(move |level| {
                    let mut next = prefix.clone();
                    next.push(level.clone());
                    next
                })
            })
            .collect()
    })
}

fn is_center(factors: &[Factor], combination: &[Level]) -> bool {
    factors
        .iter()
        .zip(combination)
        .filter(|(f, _)| f.is_quantitative())
        .all(|(f, level)| {
            let n = f.levels.len();
            n % 2 == 1 && f.levels[n / 2] == *level
        })
}
