//! Regression model for DOE.
//!
//! Quantitative factors enter as continuous terms and categorical factors as
//! treatment-coded terms, with the same pairwise interactions as the ANOVA
//! model. The result is a predictive equation rather than a variance
//! decomposition.

use std::fmt::Write as _;

use tracing::debug;

use super::anova::{is_significant, log_fit};
use super::formula::{MixedType, ModelSpec};
use super::ols;
use super::prepare::PreparedData;
use super::stats::{t_critical, t_two_sided_p_value};
use super::types::{AnalysisConfig, Coefficient, Regression};
use crate::error::Result;

/// Fit the mixed-type regression model for one response.
///
/// # Errors
///
/// Returns a computation error if no observation is usable or the model
/// cannot be fitted.
pub fn calculate_regression(
    data: &PreparedData,
    response: &[Option<f64>],
    response_name: &str,
    config: &AnalysisConfig,
) -> Result<Regression> {
    let spec = ModelSpec::pairwise(data, response, &MixedType)?;
    debug!(formula = %spec.describe(), "fitting regression model");

    let fit = ols::fit(&spec.full_matrix(), config.rank_tolerance)?;
    log_fit("regression", &fit);

    let df_resid = fit.df_resid();
    let t_crit = t_critical(config.confidence_level, df_resid);

    let coefficients: Vec<Coefficient> = fit
        .labels
        .iter()
        .zip(fit.coefficients.iter().zip(&fit.std_errors))
        .map(|(term, (&coefficient, &std_error))| {
            let t_value = coefficient.zip(std_error).map(|(b, se)| b / se);
            let p_value = t_value.map(|t| t_two_sided_p_value(t, df_resid));
            let half_width = std_error.map(|se| t_crit * se);
            Coefficient {
                term: term.clone(),
                coefficient,
                std_error,
                t_value,
                p_value,
                ci_lower: coefficient.zip(half_width).map(|(b, h)| b - h),
                ci_upper: coefficient.zip(half_width).map(|(b, h)| b + h),
                is_significant: is_significant(p_value, config.significance_level),
            }
        })
        .collect();

    Ok(Regression {
        equation: equation(response_name, &coefficients),
        coefficients,
        r_squared: fit.r_squared(),
        r_squared_adj: fit.adj_r_squared(),
        rmse: fit.mse_resid().sqrt(),
        aic: fit.aic(),
        bic: fit.bic(),
    })
}

/// Render `"Y = b0 + b1*term1 - b2*term2 ..."` with three decimals.
///
/// Aliased terms (no coefficient) are left out.
#[must_use]
pub fn equation(response_name: &str, coefficients: &[Coefficient]) -> String {
    let mut out = String::from(response_name);
    out.push_str(" =");
    let mut iter = coefficients.iter();
    if let Some(b0) = iter.next().and_then(|c| c.coefficient) {
        let _ = write!(out, " {b0:.3}");
    }
    for c in iter {
        if let Some(b) = c.coefficient {
            let _ = write!(out, " {b:+.3}*{}", c.term);
        }
    }
    out
}
