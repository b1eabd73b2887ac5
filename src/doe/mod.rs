//! DOE (Design of Experiments) analysis module.
//!
//! This module provides a complete factorial analysis of one response:
//! - Data preparation and validation
//! - Type II ANOVA over an all-categorical pairwise model
//! - Mixed-type regression with a readable equation
//! - Main and two-factor interaction effects
//! - Residual diagnostics (Shapiro-Wilk, Durbin-Watson)
//! - Coded sign table with Yates effects and percent contributions
//! - Plot-ready projections
//!
//! ## Quick Start
//!
//! ```rust
//! use doe_engine::doe::{analyze, AnalysisConfig};
//! use doe_engine::experiment::{Experiment, Factor, ResponseVariable, Run};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exp = Experiment::new(1, "Bearing life");
//! exp.factors = vec![
//!     Factor::quantitative(1, "Temperature", "T", &[150.0, 200.0]),
//!     Factor::quantitative(2, "Load", "L", &[10.0, 20.0]),
//! ];
//! exp.responses = vec![ResponseVariable::new(1, "Life", "h")];
//! let data = [(150.0, 10.0, 82.0), (200.0, 10.0, 95.0), (150.0, 20.0, 70.0), (200.0, 20.0, 91.0)];
//! for (i, (t, l, y)) in data.into_iter().enumerate() {
//!     let order = i as i64 + 1;
//!     let run = Run::new(order, order).with_factor(1, t).with_factor(2, l);
//!     exp.runs.push(run.with_response(1, y));
//! }
//!
//! let result = analyze(&exp, &AnalysisConfig::default())?;
//! assert_eq!(result.effects.main("T").map(|e| e.effect), Some(17.0));
//! println!("{}", result.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Output
//!
//! [`DoeAnalysis::to_value`] composes the sections `metadata`, `summary`,
//! `anova`, `regression`, `effects`, `residuals`, `plots_data`,
//! `interaction_data` and `design_matrix` into one [`ResultValue`] tree with
//! every NaN/±∞ replaced by null.

mod anova;
mod effects;
mod formula;
mod ols;
mod plots;
mod prepare;
mod regression;
mod render;
mod residuals;
mod sign_matrix;
pub mod stats;
mod summary;
mod types;

pub use formula::{
    pairwise_terms, AllCategorical, EncodingStrategy, FactorEncoding, MixedType, ModelMatrix,
    ModelSpec, Term,
};
pub use ols::OlsFit;
pub use prepare::{prepare, validate, DesignTable, PreparedData, ResponseTable};
pub use render::ToValue;
pub use sign_matrix::combinations;
pub use types::{
    AnalysisConfig, AnovaRow, AnovaTable, AutocorrelationTest, Coefficient, ColumnKind, Effects,
    FactorInfo, InteractionCombination, InteractionData, InteractionEffect, InteractionPoint,
    InteractionSeries, MainEffect, Metadata, NormalityTest, Pareto, PlotFactor, PlotsData,
    Regression, ResidualAnalysis, ResidualStats, SignCell, SignHeader, SignRow, SignTable, Summary,
};

use tracing::info;

use crate::error::{Error, Result};
use crate::experiment::Experiment;
use crate::value::{sanitize, ResultValue};

/// Complete analysis of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct DoeAnalysis {
    /// Experiment and response identification.
    pub metadata: Metadata,
    /// Descriptive statistics of the response.
    pub summary: Summary,
    /// Type II ANOVA table.
    pub anova: AnovaTable,
    /// Mixed-type regression.
    pub regression: Regression,
    /// Main and interaction effects.
    pub effects: Effects,
    /// Residual diagnostics.
    pub residuals: ResidualAnalysis,
    /// Pareto, main-effect and residual plot data.
    pub plots_data: PlotsData,
    /// Interaction plots for every ordered factor pair.
    pub interaction_data: InteractionData,
    /// Coded sign table.
    pub design_matrix: SignTable,
}

impl DoeAnalysis {
    /// Compose every section into one sanitized value tree.
    #[must_use]
    pub fn to_value(&self) -> ResultValue {
        sanitize(ResultValue::map([
            ("metadata", self.metadata.to_value()),
            ("summary", self.summary.to_value()),
            ("anova", self.anova.to_value()),
            ("regression", self.regression.to_value()),
            ("effects", self.effects.to_value()),
            ("residuals", self.residuals.to_value()),
            ("plots_data", self.plots_data.to_value()),
            ("interaction_data", self.interaction_data.to_value()),
            ("design_matrix", self.design_matrix.to_value()),
        ]))
    }

    /// Render the sanitized result as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        self.to_value().to_json()
    }
}

/// Analyze the configured response (the first one when none is set).
///
/// # Errors
///
/// Returns a validation error when the configuration or the experiment data
/// is insufficient, and a computation error when a model cannot be fitted.
pub fn analyze(experiment: &Experiment, config: &AnalysisConfig) -> Result<DoeAnalysis> {
    config.validate()?;
    let data = prepare(experiment)?;
    let name = match &config.response {
        Some(name) => name.clone(),
        None => data
            .responses
            .first()
            .map(|r| r.name.clone())
            .ok_or(Error::NoResponses)?,
    };
    analyze_prepared(experiment, &data, &name, config)
}

/// Analyze the named response.
///
/// # Errors
///
/// Returns [`Error::UnknownResponse`] when no response has that name, plus
/// every error of [`analyze`].
pub fn analyze_response(
    experiment: &Experiment,
    response: &str,
    config: &AnalysisConfig,
) -> Result<DoeAnalysis> {
    let config = config.clone().with_response(response);
    analyze(experiment, &config)
}

/// Analyze every response of the experiment independently.
///
/// With the `parallel` feature the responses are analyzed on the rayon
/// thread pool. Results follow response ordinal order either way.
///
/// # Errors
///
/// Returns the first error met by any response.
pub fn analyze_all_responses(
    experiment: &Experiment,
    config: &AnalysisConfig,
) -> Result<Vec<DoeAnalysis>> {
    config.validate()?;
    let data = prepare(experiment)?;
    analyze_each(experiment, &data, config)
}

#[cfg(feature = "parallel")]
fn analyze_each(
    experiment: &Experiment,
    data: &PreparedData,
    config: &AnalysisConfig,
) -> Result<Vec<DoeAnalysis>> {
    crate::parallel::par_analyze_responses(experiment, data, config)
}

#[cfg(not(feature = "parallel"))]
fn analyze_each(
    experiment: &Experiment,
    data: &PreparedData,
    config: &AnalysisConfig,
) -> Result<Vec<DoeAnalysis>> {
    data.responses
        .iter()
        .map(|r| analyze_prepared(experiment, data, &r.name, config))
        .collect()
}

/// Run every section for one response over already prepared data.
pub(crate) fn analyze_prepared(
    experiment: &Experiment,
    data: &PreparedData,
    response_name: &str,
    config: &AnalysisConfig,
) -> Result<DoeAnalysis> {
    let response = data.response_values(response_name)?;
    info!(
        experiment = experiment.id,
        response = response_name,
        runs = data.num_runs(),
        factors = data.factors.len(),
        "analyzing response"
    );

    let metadata = Metadata {
        experiment_id: experiment.id,
        experiment_slug: experiment.slug.clone(),
        experiment_title: experiment.title.clone(),
        design_type: experiment.design_type.as_str().to_string(),
        response_variable: response_name.to_string(),
        num_factors: data.factors.len(),
        num_runs: data.num_runs(),
        factors: data
            .factors
            .iter()
            .map(|f| FactorInfo {
                id: f.id,
                name: f.name.clone(),
                symbol: f.symbol.clone(),
                kind: f.kind,
            })
            .collect(),
    };

    let summary = summary::summarize(&response)?;
    let anova = anova::calculate_anova(data, &response, config)?;
    let regression = regression::calculate_regression(data, &response, response_name, config)?;
    let effects = effects::calculate_effects(data, &response);
    let residuals = residuals::analyze_residuals(data, &response, config)?;
    let plots_data = plots::plots_data(&effects, &residuals);
    let interaction_data = plots::interaction_data(data, &response);
    let design_matrix = sign_matrix::build_sign_table(data, &response, response_name);

    Ok(DoeAnalysis {
        metadata,
        summary,
        anova,
        regression,
        effects,
        residuals,
        plots_data,
        interaction_data,
        design_matrix,
    })
}
