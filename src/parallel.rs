//! Parallel multi-response analysis.
//!
//! Each response of an experiment is analyzed independently, so the
//! responses are fanned out over the rayon thread pool. The prepared tables
//! are shared read-only; nothing is mutated while the workers run.
//! Enable with the `parallel` feature flag.
//!
//! # Usage
//!
//! ```ignore
//! use doe_engine::doe::{analyze_all_responses, AnalysisConfig};
//!
//! let results = analyze_all_responses(&experiment, &AnalysisConfig::default())?;
//! for r in &results {
//!     println!("{}: R² = {:.3}", r.metadata.response_variable, r.anova.r_squared);
//! }
//! ```
//!
//! For experiments with a single response there is nothing to parallelize;
//! [`crate::doe::analyze`] is the better entry point.

use rayon::prelude::*;
use tracing::debug;

use crate::doe::{analyze_prepared, AnalysisConfig, DoeAnalysis, PreparedData};
use crate::error::Result;
use crate::experiment::Experiment;

/// Analyze every prepared response on the rayon pool, in response order.
///
/// # Errors
///
/// Returns the error of the first failing response (in response order).
pub fn par_analyze_responses(
    experiment: &Experiment,
    data: &PreparedData,
    config: &AnalysisConfig,
) -> Result<Vec<DoeAnalysis>> {
    debug!(
        responses = data.responses.len(),
        threads = rayon::current_num_threads(),
        "analyzing responses in parallel"
    );
    data.responses
        .par_iter()
        .map(|r| analyze_prepared(experiment, data, &r.name, config))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doe::prepare;
    use crate::experiment::{Factor, ResponseVariable, Run};

    #[test]
    fn test_par_matches_sequential() {
        let mut exp = Experiment::new(1, "Parallel");
        exp.factors = vec![
            Factor::quantitative(1, "A", "A", &[0.0, 1.0]),
            Factor::quantitative(2, "B", "B", &[0.0, 1.0]),
        ];
        exp.responses = (1..=4)
            .map(|id| ResponseVariable::new(id, &format!("Y{id}"), ""))
            .collect();
        for i in 0..8_i64 {
            let mut run = Run::new(i + 1, i + 1)
                .with_factor(1, (i % 2) as f64)
                .with_factor(2, ((i / 2) % 2) as f64);
            for id in 1..=4_u64 {
                run = run.with_response(id, (i * i) as f64 + id as f64 * (i % 3) as f64);
            }
            exp.runs.push(run);
        }

        let data = prepare(&exp).unwrap();
        let config = AnalysisConfig::default();
        let par = par_analyze_responses(&exp, &data, &config).unwrap();
        assert_eq!(par.len(), 4);
        for (i, result) in par.iter().enumerate() {
            let name = format!("Y{}", i + 1);
            let seq = analyze_prepared(&exp, &data, &name, &config).unwrap();
            assert_eq!(result.metadata.response_variable, name);
            assert_eq!(result.design_matrix.totals, seq.design_matrix.totals);
        }
    }
}
