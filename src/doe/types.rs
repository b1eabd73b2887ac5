//! DOE analysis types.
//!
//! Configuration and the typed result of every analysis section. Each result
//! is rendered into a [`crate::value::ResultValue`] tree by the `render`
//! module before leaving the engine.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::experiment::{FactorId, FactorKind, Level};

/// Configuration for DOE analysis.
///
/// Defaults reproduce the classical fixed thresholds (5% significance, 95%
/// intervals, Durbin-Watson band 1.5–2.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Name of the response to analyze. `None` selects the first response.
    pub response: Option<String>,
    /// p-value below which a term is flagged significant (default: 0.05).
    pub significance_level: f64,
    /// Confidence level for coefficient intervals (default: 0.95).
    pub confidence_level: f64,
    /// Shapiro-Wilk p-value above which residuals are called normal (default: 0.05).
    pub normality_alpha: f64,
    /// Open interval of Durbin-Watson values read as "no autocorrelation".
    pub durbin_watson_bounds: (f64, f64),
    /// Relative norm below which a model column counts as aliased (default: 1e-9).
    pub rank_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            response: None,
            significance_level: 0.05,
            confidence_level: 0.95,
            normality_alpha: 0.05,
            durbin_watson_bounds: (1.5, 2.5),
            rank_tolerance: 1e-9,
        }
    }
}

impl AnalysisConfig {
    /// Select the response to analyze.
    #[must_use]
    pub fn with_response(mut self, name: impl Into<String>) -> Self {
        self.response = Some(name.into());
        self
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if the TOML is malformed or the
    /// resulting configuration fails [`AnalysisConfig::validate`].
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| Error::invalid_params(format!("analysis config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every level lies in (0, 1) and the bounds are ordered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        let open_unit = |name: &str, v: f64| {
            if v > 0.0 && v < 1.0 {
                Ok(())
            } else {
                Err(Error::invalid_params(format!("{name} must be in (0, 1), got {v}")))
            }
        };
        open_unit("significance_level", self.significance_level)?;
        open_unit("confidence_level", self.confidence_level)?;
        open_unit("normality_alpha", self.normality_alpha)?;

        let (low, high) = self.durbin_watson_bounds;
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(Error::invalid_params(format!(
                "durbin_watson_bounds must be finite and increasing, got ({low}, {high})"
            )));
        }
        if !(self.rank_tolerance.is_finite() && self.rank_tolerance > 0.0) {
            return Err(Error::invalid_params(format!(
                "rank_tolerance must be positive, got {}",
                self.rank_tolerance
            )));
        }
        Ok(())
    }
}

/// Short description of a factor, shared by several sections.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorInfo {
    /// Factor id.
    pub id: FactorId,
    /// Full name.
    pub name: String,
    /// Symbol.
    pub symbol: String,
    /// Declared kind.
    pub kind: FactorKind,
}

/// Identification of the analyzed experiment and response.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Experiment id.
    pub experiment_id: u64,
    /// Experiment slug.
    pub experiment_slug: String,
    /// Experiment title.
    pub experiment_title: String,
    /// Declared design type, wire name.
    pub design_type: String,
    /// Analyzed response.
    pub response_variable: String,
    /// Number of factors.
    pub num_factors: usize,
    /// Number of included runs.
    pub num_runs: usize,
    /// Factors in ordinal order.
    pub factors: Vec<FactorInfo>,
}

/// Descriptive statistics of the analyzed response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Mean.
    pub mean: f64,
    /// Sample standard deviation (0 for a single value).
    pub std: f64,
    /// Minimum.
    pub min: f64,
    /// Maximum.
    pub max: f64,
    /// `max − min`.
    pub range: f64,
    /// Coefficient of variation in percent, `None` when the mean is 0.
    pub cv: Option<f64>,
}

/// One row of the ANOVA table.
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaRow {
    /// Display label: a term, `"Residual"` or `"Total"`.
    pub source: String,
    /// Degrees of freedom.
    pub df: usize,
    /// Sum of squares.
    pub sum_sq: f64,
    /// Mean square, `None` when `df` is 0 and for the total row.
    pub mean_sq: Option<f64>,
    /// F statistic.
    pub f_value: Option<f64>,
    /// p-value of the F test.
    pub p_value: Option<f64>,
    /// `p_value < significance_level`.
    pub is_significant: bool,
}

/// Type II ANOVA table with model fit statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaTable {
    /// Term rows, then `Residual` (when it has df), then `Total`.
    pub rows: Vec<AnovaRow>,
    /// Overall model F statistic.
    pub model_f_statistic: f64,
    /// p-value of the overall F test.
    pub model_p_value: f64,
    /// R².
    pub r_squared: f64,
    /// Adjusted R².
    pub r_squared_adj: f64,
}

impl AnovaTable {
    /// Find a row by its source label.
    #[must_use]
    pub fn row(&self, source: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.source == source)
    }
}

/// One regression coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    /// Display term, e.g. `"Temperature (T)"` or `"Material (M)[T.b]"`.
    pub term: String,
    /// Estimate, `None` when the column is aliased.
    pub coefficient: Option<f64>,
    /// Standard error.
    pub std_error: Option<f64>,
    /// t statistic.
    pub t_value: Option<f64>,
    /// Two-sided p-value.
    pub p_value: Option<f64>,
    /// Lower confidence bound.
    pub ci_lower: Option<f64>,
    /// Upper confidence bound.
    pub ci_upper: Option<f64>,
    /// `p_value < significance_level`.
    pub is_significant: bool,
}

/// Fitted regression model.
#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    /// Coefficients, intercept first.
    pub coefficients: Vec<Coefficient>,
    /// Readable equation.
    pub equation: String,
    /// R².
    pub r_squared: f64,
    /// Adjusted R².
    pub r_squared_adj: f64,
    /// Root mean squared residual.
    pub rmse: f64,
    /// Akaike information criterion.
    pub aic: f64,
    /// Bayesian information criterion.
    pub bic: f64,
}

/// Main effect of one factor.
#[derive(Debug, Clone, PartialEq)]
pub struct MainEffect {
    /// Factor name.
    pub factor: String,
    /// Factor symbol.
    pub symbol: String,
    /// Range of level means (max − min).
    pub effect: f64,
    /// Sorted observed levels.
    pub levels: Vec<Level>,
    /// Mean response per level, `None` where a level has no data.
    pub means: Vec<Option<f64>>,
}

/// Two-factor interaction effect.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEffect {
    /// Key, `"A:B"`.
    pub key: String,
    /// Member symbols.
    pub factors: [String; 2],
    /// Range of cell means (max − min).
    pub effect: f64,
    /// Cell label `"A=a,B=b"` to mean, empty cells omitted.
    pub cell_means: Vec<(String, f64)>,
}

/// Main effects and two-factor interactions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Effects {
    /// Main effects in factor order.
    pub main_effects: Vec<MainEffect>,
    /// Interactions in pair order.
    pub interactions: Vec<InteractionEffect>,
}

impl Effects {
    /// Main effect of a factor by symbol.
    #[must_use]
    pub fn main(&self, symbol: &str) -> Option<&MainEffect> {
        self.main_effects.iter().find(|e| e.symbol == symbol)
    }

    /// Interaction by key (`"A:B"`).
    #[must_use]
    pub fn interaction(&self, key: &str) -> Option<&InteractionEffect> {
        self.interactions.iter().find(|e| e.key == key)
    }
}

/// Shapiro-Wilk result on the residuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalityTest {
    /// W statistic.
    pub statistic: f64,
    /// p-value.
    pub p_value: f64,
    /// `p_value > normality_alpha`.
    pub is_normal: bool,
}

/// Durbin-Watson result on the residuals.
#[derive(Debug, Clone, PartialEq)]
pub struct AutocorrelationTest {
    /// DW statistic.
    pub statistic: f64,
    /// `"no autocorrelation"` or `"possible autocorrelation"`.
    pub interpretation: String,
}

/// Mean, spread and extremes of the residuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualStats {
    /// Mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub std: f64,
    /// Minimum.
    pub min: f64,
    /// Maximum.
    pub max: f64,
}

/// Residual diagnostics of the all-categorical pairwise model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualAnalysis {
    /// Observed − fitted.
    pub residuals: Vec<f64>,
    /// Fitted values.
    pub fitted_values: Vec<f64>,
    /// Residuals over their sample standard deviation.
    pub standardized_residuals: Vec<f64>,
    /// Normality test, `None` when it cannot be evaluated.
    pub normality_test: Option<NormalityTest>,
    /// Autocorrelation test.
    pub autocorrelation_test: AutocorrelationTest,
    /// Residual summary.
    pub residual_stats: ResidualStats,
}

/// Pareto chart of effect magnitudes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pareto {
    /// Term labels, largest magnitude first.
    pub labels: Vec<String>,
    /// |effect| per label.
    pub values: Vec<f64>,
    /// Cumulative percent of total magnitude.
    pub cumulative: Vec<f64>,
    /// Whether each label is an interaction.
    pub is_interaction: Vec<bool>,
}

/// Plot-ready projections of effects and residuals.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotsData {
    /// Pareto of effects.
    pub pareto: Pareto,
    /// Main effects as `(symbol, levels, means)`.
    pub main_effects: Vec<(String, Vec<Level>, Vec<Option<f64>>)>,
    /// Two-factor interactions.
    pub interactions: Vec<InteractionEffect>,
    /// Residuals.
    pub residuals: Vec<f64>,
    /// Fitted values.
    pub fitted: Vec<f64>,
    /// Standardized residuals.
    pub standardized: Vec<f64>,
}

/// Axis descriptor of an interaction plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotFactor {
    /// Factor id.
    pub id: FactorId,
    /// Factor name.
    pub name: String,
    /// Factor symbol.
    pub symbol: String,
    /// Sorted observed levels.
    pub levels: Vec<Level>,
}

/// One point of an interaction-plot series.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionPoint {
    /// Level on the x axis.
    pub x: Level,
    /// Mean response, `None` for an empty combination.
    pub y: Option<f64>,
    /// Sample standard deviation (0 for one value), `None` when empty.
    pub std: Option<f64>,
    /// Number of observations.
    pub n: usize,
    /// Observed values.
    pub raw_values: Vec<f64>,
}

/// One line of an interaction plot.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSeries {
    /// `"<line factor name> = <level>"`.
    pub name: String,
    /// Level of the line factor.
    pub level: Level,
    /// One point per x level.
    pub points: Vec<InteractionPoint>,
}

/// Interaction plot for one ordered pair of factors.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionCombination {
    /// Factor on the x axis.
    pub factor_x: PlotFactor,
    /// Factor drawn as separate lines.
    pub factor_lines: PlotFactor,
    /// One series per line level.
    pub series: Vec<InteractionSeries>,
}

/// Interaction plots for every ordered factor pair.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionData {
    /// All ordered pairs.
    pub combinations: Vec<InteractionCombination>,
    /// Symbol of the first factor.
    pub default_x: Option<String>,
    /// Symbol of the second factor.
    pub default_lines: Option<String>,
}

/// Role of a sign-table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Constant column of ones.
    Intercept,
    /// A single factor.
    Factor,
    /// Product of two or more factors.
    Interaction,
    /// The analyzed response.
    Response,
}

impl ColumnKind {
    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intercept => "intercept",
            Self::Factor => "factor",
            Self::Interaction => "interaction",
            Self::Response => "response",
        }
    }

    /// Whether the column carries a Yates effect.
    #[must_use]
    pub fn has_effect(self) -> bool {
        matches!(self, Self::Factor | Self::Interaction)
    }
}

/// Header of one sign-table column.
#[derive(Debug, Clone, PartialEq)]
pub struct SignHeader {
    /// Column symbol (`I`, factor symbol, concatenated symbols, `Y`).
    pub symbol: String,
    /// Column name.
    pub name: String,
    /// Column role.
    pub kind: ColumnKind,
    /// Factor id, for factor columns.
    pub factor_id: Option<FactorId>,
    /// Factor kind, for factor columns.
    pub data_type: Option<FactorKind>,
    /// `(low, high)` real values coded −1/+1, for two-level factorials.
    pub level_mapping: Option<(f64, f64)>,
    /// Member symbols, for interaction columns.
    pub factors: Vec<String>,
    /// Interaction order, for interaction columns.
    pub order: Option<usize>,
}

/// One cell of the sign table.
#[derive(Debug, Clone, PartialEq)]
pub enum SignCell {
    /// Numeric entry.
    Number(f64),
    /// Categorical label.
    Text(String),
    /// Missing or undefined.
    Null,
}

impl SignCell {
    /// Numeric payload, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) | Self::Null => None,
        }
    }
}

/// One run of the sign table.
#[derive(Debug, Clone, PartialEq)]
pub struct SignRow {
    /// Run order.
    pub run_order: i64,
    /// Standard order.
    pub standard_order: i64,
    /// Center point flag.
    pub is_center_point: bool,
    /// Real values, one per header.
    pub values: Vec<SignCell>,
    /// Coded values, one per header.
    pub values_coded: Vec<SignCell>,
}

/// Coded contrast table with totals, effects and contributions.
#[derive(Debug, Clone, PartialEq)]
pub struct SignTable {
    /// Column headers.
    pub headers: Vec<SignHeader>,
    /// Rows in standard order.
    pub rows: Vec<SignRow>,
    /// Column totals.
    pub totals: Vec<f64>,
    /// Column totals over the run count.
    pub means: Vec<Option<f64>>,
    /// Yates effects, factor and interaction columns only.
    pub effects: Vec<Option<f64>>,
    /// Percent contributions, factor and interaction columns only.
    pub contributions: Vec<Option<f64>>,
    /// Number of included runs.
    pub n_runs: usize,
    /// Every factor quantitative with exactly two observed values.
    pub is_two_level_factorial: bool,
}

impl SignTable {
    /// Column index of a symbol.
    #[must_use]
    pub fn column(&self, symbol: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.symbol == symbol)
    }

    /// Yates effect of a column by symbol.
    #[must_use]
    pub fn effect(&self, symbol: &str) -> Option<f64> {
        self.column(symbol).and_then(|c| self.effects[c])
    }

    /// Percent contribution of a column by symbol.
    #[must_use]
    pub fn contribution(&self, symbol: &str) -> Option<f64> {
        self.column(symbol).and_then(|c| self.contributions[c])
    }
}
