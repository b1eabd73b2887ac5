//! Experiment data model.
//!
//! These are the read-only input entities handed to the engine: an
//! [`Experiment`] with its [`Factor`]s, [`ResponseVariable`]s and [`Run`]s.
//! Persistence, authorization and run bookkeeping live outside this crate;
//! the engine only ever reads a snapshot of these types.
//!
//! Factors and responses carry an explicit `ordinal`. Every ordered view
//! ([`Experiment::ordered_factors`], [`Experiment::ordered_responses`]) sorts
//! by it, so the order of the backing vectors never leaks into results.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a factor within an experiment.
pub type FactorId = u64;

/// Identifier of a response variable within an experiment.
pub type ResponseId = u64;

/// Design type declared on an experiment.
///
/// Only full-factorial semantics are exercised by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignType {
    /// Every combination of factor levels.
    #[default]
    FullFactorial,
    /// A fraction of the full factorial.
    FractionalFactorial,
    /// Plackett-Burman screening design.
    PlackettBurman,
    /// Box-Behnken response surface design.
    BoxBehnken,
    /// Central composite response surface design.
    CentralComposite,
}

impl DesignType {
    /// Wire name of the design type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullFactorial => "full_factorial",
            Self::FractionalFactorial => "fractional_factorial",
            Self::PlackettBurman => "plackett_burman",
            Self::BoxBehnken => "box_behnken",
            Self::CentralComposite => "central_composite",
        }
    }
}

/// Declared data type of a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// Numeric levels (temperature, pressure, ...).
    Quantitative,
    /// Unordered labels (material, supplier, ...).
    Categorical,
}

impl FactorKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quantitative => "quantitative",
            Self::Categorical => "categorical",
        }
    }
}

/// Optimization goal of a response. Informational only to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    /// Larger is better.
    Maximize,
    /// Smaller is better.
    Minimize,
    /// Hit a target value.
    Target,
    /// No stated goal.
    #[default]
    None,
}

/// A factor level: either a number or a label.
///
/// Levels are totally ordered: numbers sort before labels, numbers by
/// [`f64::total_cmp`], labels lexicographically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    /// Numeric level.
    Number(f64),
    /// Text label.
    Label(String),
}

impl Level {
    /// Numeric value, if this level is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Label(_) => None,
        }
    }

    /// Numeric value, parsing labels that spell a number.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Label(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Level {}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Label(_)) => Ordering::Less,
            (Self::Label(_), Self::Number(_)) => Ordering::Greater,
            (Self::Label(a), Self::Label(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the trailing ".0" on integral values: 4.0, not 4
            Self::Number(v) => write!(f, "{v:?}"),
            Self::Label(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Level {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Level {
    fn from(s: &str) -> Self {
        Self::Label(s.to_string())
    }
}

impl From<String> for Level {
    fn from(s: String) -> Self {
        Self::Label(s)
    }
}

/// An independent variable of the experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    /// Identifier used as key in [`Run::factor_values`].
    pub id: FactorId,
    /// Position of the factor in every ordered view.
    pub ordinal: u32,
    /// Full name, e.g. "Temperature".
    pub name: String,
    /// Short symbol, unique within the experiment, e.g. "T".
    pub symbol: String,
    /// Declared data type.
    pub kind: FactorKind,
    /// Decimal places for display.
    #[serde(default = "default_precision")]
    pub precision: u32,
    /// Declared levels.
    #[serde(default)]
    pub levels: Vec<Level>,
}

fn default_precision() -> u32 {
    2
}

impl Factor {
    /// Create a quantitative factor. The ordinal defaults to the id.
    #[must_use]
    pub fn quantitative(id: FactorId, name: &str, symbol: &str, levels: &[f64]) -> Self {
        Self {
            id,
            ordinal: u32::try_from(id).unwrap_or(u32::MAX),
            name: name.to_string(),
            symbol: symbol.to_string(),
            kind: FactorKind::Quantitative,
            precision: default_precision(),
            levels: levels.iter().copied().map(Level::Number).collect(),
        }
    }

    /// Create a categorical factor. The ordinal defaults to the id.
    #[must_use]
    pub fn categorical(id: FactorId, name: &str, symbol: &str, labels: &[&str]) -> Self {
        Self {
            id,
            ordinal: u32::try_from(id).unwrap_or(u32::MAX),
            name: name.to_string(),
            symbol: symbol.to_string(),
            kind: FactorKind::Categorical,
            precision: default_precision(),
            levels: labels.iter().map(|&l| Level::from(l)).collect(),
        }
    }

    /// Override the ordinal.
    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Display label used in model output: `"<Name> (<Symbol>)"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }

    /// Whether the factor is quantitative.
    #[must_use]
    pub fn is_quantitative(&self) -> bool {
        self.kind == FactorKind::Quantitative
    }
}

/// A measured dependent variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseVariable {
    /// Identifier used as key in [`Run::response_values`].
    pub id: ResponseId,
    /// Position of the response in every ordered view.
    pub ordinal: u32,
    /// Name, unique within the experiment.
    pub name: String,
    /// Unit of measurement.
    #[serde(default)]
    pub unit: String,
    /// Optimization goal.
    #[serde(default)]
    pub goal: OptimizationGoal,
}

impl ResponseVariable {
    /// Create a response. The ordinal defaults to the id.
    #[must_use]
    pub fn new(id: ResponseId, name: &str, unit: &str) -> Self {
        Self {
            id,
            ordinal: u32::try_from(id).unwrap_or(u32::MAX),
            name: name.to_string(),
            unit: unit.to_string(),
            goal: OptimizationGoal::None,
        }
    }

    /// Override the ordinal.
    #[must_use]
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }
}

/// One experimental run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Fixed position in the design matrix.
    pub standard_order: i64,
    /// Randomized execution position.
    pub run_order: i64,
    /// Replicate number (1-based).
    #[serde(default = "default_replicate")]
    pub replicate: u32,
    /// Whether this run sits at the center of every quantitative factor.
    #[serde(default)]
    pub is_center_point: bool,
    /// Observed factor levels keyed by factor id.
    #[serde(default)]
    pub factor_values: BTreeMap<FactorId, Level>,
    /// Observed responses keyed by response id.
    #[serde(default)]
    pub response_values: BTreeMap<ResponseId, f64>,
    /// Whether the run is excluded from analysis.
    #[serde(default)]
    pub is_excluded: bool,
}

fn default_replicate() -> u32 {
    1
}

impl Run {
    /// Create an empty run.
    #[must_use]
    pub fn new(standard_order: i64, run_order: i64) -> Self {
        Self {
            standard_order,
            run_order,
            replicate: 1,
            is_center_point: false,
            factor_values: BTreeMap::new(),
            response_values: BTreeMap::new(),
            is_excluded: false,
        }
    }

    /// Set a factor value.
    #[must_use]
    pub fn with_factor(mut self, id: FactorId, level: impl Into<Level>) -> Self {
        self.factor_values.insert(id, level.into());
        self
    }

    /// Set a response value.
    #[must_use]
    pub fn with_response(mut self, id: ResponseId, value: f64) -> Self {
        self.response_values.insert(id, value);
        self
    }

    /// Mark the run excluded.
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.is_excluded = true;
        self
    }

    /// A run is complete when it has a value for every response.
    #[must_use]
    pub fn is_complete(&self, responses: &[ResponseVariable]) -> bool {
        !responses.is_empty()
            && responses
                .iter()
                .all(|r| self.response_values.contains_key(&r.id))
    }
}

/// A designed experiment snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Experiment {
    /// Experiment identifier.
    #[serde(default)]
    pub id: u64,
    /// URL slug.
    #[serde(default)]
    pub slug: String,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Declared design type.
    #[serde(default)]
    pub design_type: DesignType,
    /// Factors, in any order.
    #[serde(default)]
    pub factors: Vec<Factor>,
    /// Response variables, in any order.
    #[serde(default)]
    pub responses: Vec<ResponseVariable>,
    /// Runs, in any order, excluded ones included.
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Experiment {
    /// Create an empty full-factorial experiment.
    #[must_use]
    pub fn new(id: u64, title: &str) -> Self {
        Self {
            id,
            slug: slugify(title),
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Factors sorted by ordinal (ties broken by id).
    #[must_use]
    pub fn ordered_factors(&self) -> Vec<Factor> {
        let mut factors = self.factors.clone();
        factors.sort_by_key(|f| (f.ordinal, f.id));
        factors
    }

    /// Responses sorted by ordinal (ties broken by id).
    #[must_use]
    pub fn ordered_responses(&self) -> Vec<ResponseVariable> {
        let mut responses = self.responses.clone();
        responses.sort_by_key(|r| (r.ordinal, r.id));
        responses
    }

    /// Non-excluded runs in ascending standard order.
    #[must_use]
    pub fn included_runs(&self) -> Vec<Run> {
        let mut runs: Vec<Run> = self.runs.iter().filter(|r| !r.is_excluded).cloned().collect();
        runs.sort_by_key(|r| r.standard_order);
        runs
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        let mut levels = vec![
            Level::from("b"),
            Level::Number(16.0),
            Level::from("a"),
            Level::Number(4.0),
        ];
        levels.sort();
        assert_eq!(
            levels,
            vec![
                Level::Number(4.0),
                Level::Number(16.0),
                Level::from("a"),
                Level::from("b"),
            ]
        );
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Number(4.0).to_string(), "4.0");
        assert_eq!(Level::Number(0.5).to_string(), "0.5");
        assert_eq!(Level::from("Steel").to_string(), "Steel");
        assert_eq!(Level::from(" 2.5 ").to_number(), Some(2.5));
    }

    #[test]
    fn test_level_deserialize_untagged() {
        let levels: Vec<Level> = serde_json::from_str(r#"[1.5, "A", -1]"#).unwrap();
        assert_eq!(
            levels,
            vec![Level::Number(1.5), Level::from("A"), Level::Number(-1.0)]
        );
    }

    #[test]
    fn test_run_completeness() {
        let responses = vec![
            ResponseVariable::new(1, "Yield", "%"),
            ResponseVariable::new(2, "Cost", "$"),
        ];
        let run = Run::new(1, 1).with_response(1, 10.0);
        assert!(!run.is_complete(&responses));
        let run = run.with_response(2, 3.0);
        assert!(run.is_complete(&responses));
        assert!(!run.is_complete(&[]));
    }

    #[test]
    fn test_factor_kind_helpers() {
        let t = Factor::quantitative(1, "Temperature", "T", &[1.0, 2.0]);
        let m = Factor::categorical(2, "Material", "M", &["a", "b"]);
        assert!(t.is_quantitative());
        assert!(!m.is_quantitative());
        assert_eq!(m.display_name(), "Material (M)");
    }

    #[test]
    fn test_ordering_by_ordinal() {
        let mut exp = Experiment::new(1, "Ordering Check");
        exp.factors = vec![
            Factor::quantitative(1, "Temperature", "T", &[1.0, 2.0]).with_ordinal(2),
            Factor::quantitative(2, "Pressure", "P", &[1.0, 2.0]).with_ordinal(1),
        ];
        exp.runs = vec![Run::new(2, 1), Run::new(1, 2), Run::new(3, 3).excluded()];

        let symbols: Vec<String> = exp.ordered_factors().into_iter().map(|f| f.symbol).collect();
        assert_eq!(symbols, vec!["P", "T"]);

        let orders: Vec<i64> = exp.included_runs().iter().map(|r| r.standard_order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(exp.slug, "ordering-check");
    }
}
