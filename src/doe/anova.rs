//! ANOVA (Analysis of Variance) for DOE.
//!
//! Every factor enters as a categorical term, whatever its declared kind, and
//! the model holds all main effects plus every two-factor interaction.
//!
//! # Algorithm
//!
//! Type II sums of squares: the sum of squares of a term `t` is the drop in
//! residual sum of squares when `t` is added to the model made of every term
//! that does not contain `t`.
//!
//! ```text
//! SS(t) = SSE(terms ⊉ t) − SSE(terms ⊉ t ∪ {t})
//! df(t) = rank(terms ⊉ t ∪ {t}) − rank(terms ⊉ t)
//! F(t)  = (SS(t) / df(t)) / MSE(full model)
//! ```
//!
//! Terms whose columns are fully aliased get `df = 0` and no mean square.

use tracing::{debug, warn};

use super::formula::{AllCategorical, ModelSpec};
use super::ols::{self, OlsFit};
use super::prepare::PreparedData;
use super::stats::f_distribution_p_value;
use super::types::{AnalysisConfig, AnovaRow, AnovaTable};
use crate::error::Result;

/// Build the Type II ANOVA table for one response.
///
/// # Errors
///
/// Returns a computation error if no observation is usable or the model
/// cannot be fitted.
pub fn calculate_anova(
    data: &PreparedData,
    response: &[Option<f64>],
    config: &AnalysisConfig,
) -> Result<AnovaTable> {
    let spec = ModelSpec::pairwise(data, response, &AllCategorical)?;
    debug!(formula = %spec.describe(), "fitting ANOVA model");

    let all: Vec<usize> = (0..spec.terms().len()).collect();
    let full = ols::fit(&spec.matrix(&all), config.rank_tolerance)?;
    log_fit("anova", &full);
    let mse = full.mse_resid();

    let mut rows = Vec::with_capacity(spec.terms().len() + 2);
    for (t, term) in spec.terms().iter().enumerate() {
        let reduced: Vec<usize> = all
            .iter()
            .copied()
            .filter(|&o| !spec.terms()[o].contains(term))
            .collect();
        let mut with_term = reduced.clone();
        with_term.push(t);
        with_term.sort_unstable();

        let fit_reduced = ols::fit(&spec.matrix(&reduced), config.rank_tolerance)?;
        let fit_with = ols::fit(&spec.matrix(&with_term), config.rank_tolerance)?;

        let sum_sq = (fit_reduced.sse - fit_with.sse).max(0.0);
        let df = fit_with.rank.saturating_sub(fit_reduced.rank);
        let mean_sq = (df > 0).then(|| sum_sq / df as f64);
        let f_value = mean_sq.map(|ms| ms / mse);
        let p_value = f_value.map(|f| f_distribution_p_value(f, df, full.df_resid()));

        rows.push(AnovaRow {
            source: spec.term_label(term),
            df,
            sum_sq,
            mean_sq,
            f_value,
            p_value,
            is_significant: is_significant(p_value, config.significance_level),
        });
    }

    if full.df_resid() > 0 {
        rows.push(AnovaRow {
            source: "Residual".to_string(),
            df: full.df_resid(),
            sum_sq: full.sse,
            mean_sq: Some(mse),
            f_value: None,
            p_value: None,
            is_significant: false,
        });
    }

    rows.push(AnovaRow {
        source: "Total".to_string(),
        df: rows.iter().map(|r| r.df).sum(),
        sum_sq: rows.iter().map(|r| r.sum_sq).sum(),
        mean_sq: None,
        f_value: None,
        p_value: None,
        is_significant: false,
    });

    let model_f_statistic = full.f_statistic();
    Ok(AnovaTable {
        rows,
        model_f_statistic,
        model_p_value: f_distribution_p_value(model_f_statistic, full.df_model(), full.df_resid()),
        r_squared: full.r_squared(),
        r_squared_adj: full.adj_r_squared(),
    })
}

pub(crate) fn is_significant(p_value: Option<f64>, level: f64) -> bool {
    p_value.is_some_and(|p| p < level)
}

pub(crate) fn log_fit(model: &str, fit: &OlsFit) {
    let aliased = fit.coefficients.iter().filter(|c| c.is_none()).count();
    if aliased > 0 {
        warn!(model, aliased, "rank-deficient model, aliased columns dropped");
    }
    debug!(
        model,
        n = fit.n,
        rank = fit.rank,
        df_resid = fit.df_resid(),
        sse = fit.sse,
        "model fitted"
    );
}
