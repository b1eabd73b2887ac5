//! Model formulas and model-matrix construction.
//!
//! A model is a list of [`Term`]s over factors referenced by position. The
//! display label of each factor lives in a separate index → name table, so
//! factor symbols are never spliced into a formula string and cannot collide
//! with anything.
//!
//! How a factor enters the model matrix is decided once, when the
//! [`ModelSpec`] is built, by an [`EncodingStrategy`]:
//!
//! - [`AllCategorical`]: every factor is a discrete term (ANOVA, residuals).
//! - [`MixedType`]: quantitative factors are continuous, categorical factors
//!   discrete (regression).
//!
//! Discrete factors use treatment coding with the lowest observed level as
//! reference, so a factor with `s` levels contributes `s − 1` columns and an
//! interaction contributes the product of its members' column counts.

use ndarray::{Array1, Array2};

use super::prepare::PreparedData;
use crate::error::{Error, Result};
use crate::experiment::{Factor, FactorKind, Level};

/// How a factor is represented in the model matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum FactorEncoding {
    /// One numeric column holding the factor's value.
    Continuous,
    /// Indicator columns for every level but the first (reference).
    Categorical {
        /// Observed levels, sorted; `levels[0]` is the reference.
        levels: Vec<Level>,
    },
}

/// Strategy choosing an encoding for each factor.
pub trait EncodingStrategy {
    /// Name of the strategy, for logging.
    fn name(&self) -> &'static str;

    /// Encode `factor`, given its sorted observed levels.
    fn encode(&self, factor: &Factor, observed: Vec<Level>) -> FactorEncoding;
}

/// Treat every factor as categorical, whatever its declared kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllCategorical;

impl EncodingStrategy for AllCategorical {
    fn name(&self) -> &'static str {
        "all-categorical"
    }

    fn encode(&self, _factor: &Factor, observed: Vec<Level>) -> FactorEncoding {
        FactorEncoding::Categorical { levels: observed }
    }
}

/// Quantitative factors continuous, categorical factors discrete.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixedType;

impl EncodingStrategy for MixedType {
    fn name(&self) -> &'static str {
        "mixed-type"
    }

    fn encode(&self, factor: &Factor, observed: Vec<Level>) -> FactorEncoding {
        match factor.kind {
            FactorKind::Quantitative => FactorEncoding::Continuous,
            FactorKind::Categorical => FactorEncoding::Categorical { levels: observed },
        }
    }
}

/// A model term: a main effect (one factor) or an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Positions of the member factors, ascending.
    pub factors: Vec<usize>,
}

impl Term {
    /// Whether every factor of `other` is also in `self`.
    #[must_use]
    pub fn contains(&self, other: &Term) -> bool {
        other.factors.iter().all(|f| self.factors.contains(f))
    }

    /// Interaction order (1 for a main effect).
    #[must_use]
    pub fn order(&self) -> usize {
        self.factors.len()
    }
}

/// Main effects plus every two-factor interaction, in formula order.
#[must_use]
pub fn pairwise_terms(num_factors: usize) -> Vec<Term> {
    let mut terms: Vec<Term> = (0..num_factors).map(|i| Term { factors: vec![i] }).collect();
    for i in 0..num_factors {
        for j in (i + 1)..num_factors {
            terms.push(Term { factors: vec![i, j] });
        }
    }
    terms
}

/// Model matrix for a subset of terms.
#[derive(Debug, Clone)]
pub struct ModelMatrix {
    /// Observations × columns; column 0 is the intercept.
    pub x: Array2<f64>,
    /// Response values of the used observations.
    pub y: Array1<f64>,
    /// Display label of each column.
    pub labels: Vec<String>,
}

/// A fully resolved model: terms, per-factor encodings, usable observations.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    terms: Vec<Term>,
    encodings: Vec<FactorEncoding>,
    display: Vec<String>,
    /// Per used observation, its factor levels (one per factor).
    rows: Vec<Vec<Level>>,
    y: Vec<f64>,
    /// Indices into the prepared runs of the used observations.
    row_index: Vec<usize>,
}

impl ModelSpec {
    /// Resolve a pairwise model for `response` over all factors.
    ///
    /// Observations missing the response or any factor value are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SingularModel`] when no observation is usable.
    pub fn pairwise(
        data: &PreparedData,
        response: &[Option<f64>],
        strategy: &dyn EncodingStrategy,
    ) -> Result<Self> {
        let k = data.factors.len();
        let mut rows = Vec::new();
        let mut y = Vec::new();
        let mut row_index = Vec::new();

        for (run, value) in response.iter().enumerate() {
            let Some(value) = value else { continue };
            let levels: Option<Vec<Level>> =
                (0..k).map(|f| data.design.get(run, f).cloned()).collect();
            if let Some(levels) = levels {
                rows.push(levels);
                y.push(*value);
                row_index.push(run);
            }
        }

        if rows.is_empty() {
            return Err(Error::singular("no observation has the response and every factor value"));
        }

        let encodings = data
            .factors
            .iter()
            .enumerate()
            .map(|(f, factor)| {
                let mut observed: Vec<Level> = rows.iter().map(|r| r[f].clone()).collect();
                observed.sort();
                observed.dedup();
                strategy.encode(factor, observed)
            })
            .collect();

        Ok(Self {
            terms: pairwise_terms(k),
            encodings,
            display: data.factors.iter().map(Factor::display_name).collect(),
            rows,
            y,
            row_index,
        })
    }

    /// Terms in formula order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Number of used observations.
    #[must_use]
    pub fn observations(&self) -> usize {
        self.y.len()
    }

    /// Prepared-run indices of the used observations.
    #[must_use]
    pub fn row_index(&self) -> &[usize] {
        &self.row_index
    }

    /// Display label of a term, e.g. `"Temperature (T):Material (M)"`.
    #[must_use]
    pub fn term_label(&self, term: &Term) -> String {
        term.factors
            .iter()
            .map(|&f| self.display[f].as_str())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Readable formula, for logging.
    #[must_use]
    pub fn describe(&self) -> String {
        let terms: Vec<String> = self.terms.iter().map(|t| self.term_label(t)).collect();
        format!("y ~ {}", terms.join(" + "))
    }

    /// Column labels and values contributed by one factor for one row.
    fn factor_columns(&self, factor: usize, level: &Level) -> Vec<(String, f64)> {
        match &self.encodings[factor] {
            FactorEncoding::Continuous => {
                vec![(self.display[factor].clone(), level.to_number().unwrap_or(f64::NAN))]
            }
            FactorEncoding::Categorical { levels } => levels
                .iter()
                .skip(1)
                .map(|l| {
                    let label = format!("{}[T.{}]", self.display[factor], l);
                    (label, if l == level { 1.0 } else { 0.0 })
                })
                .collect(),
        }
    }

    /// Columns of one term for one row: the product of its members' columns.
    fn term_columns(&self, term: &Term, row: &[Level]) -> Vec<(String, f64)> {
        let mut acc: Vec<(String, f64)> = vec![(String::new(), 1.0)];
        for &f in &term.factors {
            let cols = self.factor_columns(f, &row[f]);
            acc = acc
                .iter()
                .flat_map(|(label, value)| {
                    cols.iter().map(move |(l, v)| {
                        let joined = if label.is_empty() {
                            l.clone()
                        } else {
                            format!("{label}:{l}")
                        };
                        (joined, value * v)
                    })
                })
                .collect();
        }
        acc
    }

    /// Build the model matrix for the terms at `term_indices` plus intercept.
    #[must_use]
    pub fn matrix(&self, term_indices: &[usize]) -> ModelMatrix {
        let n = self.rows.len();
        let mut labels = vec!["Intercept".to_string()];
        let mut data: Vec<Vec<f64>> = vec![vec![1.0]; n];

        for &t in term_indices {
            let term = &self.terms[t];
            for (r, row) in self.rows.iter().enumerate() {
                let cols = self.term_columns(term, row);
                if r == 0 {
                    labels.extend(cols.iter().map(|(l, _)| l.clone()));
                }
                data[r].extend(cols.into_iter().map(|(_, v)| v));
            }
        }

        let p = labels.len();
        let x = Array2::from_shape_fn((n, p), |(i, j)| data[i][j]);
        ModelMatrix {
            x,
            y: Array1::from(self.y.clone()),
            labels,
        }
    }

    /// Model matrix with every term.
    #[must_use]
    pub fn full_matrix(&self) -> ModelMatrix {
        let all: Vec<usize> = (0..self.terms.len()).collect();
        self.matrix(&all)
    }
}
