//! Residual diagnostics.
//!
//! Refits the all-categorical pairwise model used by the ANOVA and checks its
//! residuals for normality (Shapiro-Wilk) and serial correlation
//! (Durbin-Watson) in run sequence.

use tracing::{debug, warn};

use super::anova::log_fit;
use super::formula::{AllCategorical, ModelSpec};
use super::ols;
use super::prepare::PreparedData;
use super::stats::{durbin_watson, mean, min_max, sample_std, shapiro_wilk};
use super::types::{
    AnalysisConfig, AutocorrelationTest, NormalityTest, ResidualAnalysis, ResidualStats,
};
use crate::error::Result;

/// Interpretation of a Durbin-Watson statistic against `(low, high)`.
#[must_use]
pub fn interpret_durbin_watson(statistic: f64, (low, high): (f64, f64)) -> &'static str {
    if statistic > low && statistic < high {
        "no autocorrelation"
    } else {
        "possible autocorrelation"
    }
}

/// Compute residual diagnostics for one response.
///
/// # Errors
///
/// Returns a computation error if no observation is usable or the model
/// cannot be fitted.
pub fn analyze_residuals(
    data: &PreparedData,
    response: &[Option<f64>],
    config: &AnalysisConfig,
) -> Result<ResidualAnalysis> {
    let spec = ModelSpec::pairwise(data, response, &AllCategorical)?;
    let fit = ols::fit(&spec.full_matrix(), config.rank_tolerance)?;
    log_fit("residuals", &fit);

    let residuals = fit.residuals.to_vec();
    let fitted_values = fit.fitted.to_vec();
    let std = sample_std(&residuals);
    let standardized_residuals = residuals.iter().map(|e| e / std).collect();

    let normality_test = match shapiro_wilk(&residuals) {
        Some(sw) => Some(NormalityTest {
            statistic: sw.statistic,
            p_value: sw.p_value,
            is_normal: sw.p_value > config.normality_alpha,
        }),
        None => {
            warn!(n = residuals.len(), "Shapiro-Wilk test not applicable to residuals");
            None
        }
    };

    let dw = durbin_watson(&residuals);
    debug!(durbin_watson = dw, "residual autocorrelation");

    let (min, max) = min_max(&residuals).unwrap_or((f64::NAN, f64::NAN));
    Ok(ResidualAnalysis {
        residual_stats: ResidualStats {
            mean: mean(&residuals),
            std,
            min,
            max,
        },
        residuals,
        fitted_values,
        standardized_residuals,
        normality_test,
        autocorrelation_test: AutocorrelationTest {
            statistic: dw,
            interpretation: interpret_durbin_watson(dw, config.durbin_watson_bounds).to_string(),
        },
    })
}
