//! Data preparation and validation.
//!
//! Checks that an experiment carries enough data to be analyzed and lays the
//! included runs out as two aligned tables: a design table (run × factor
//! level) and a response table (run × response value). Missing cells stay
//! `None`; every downstream aggregate filters them on its own.

use ndarray::{Array2, ArrayView1};
use tracing::debug;

use crate::error::{Error, Result};
use crate::experiment::{Experiment, Factor, FactorKind, Level, ResponseVariable, Run};

/// Run × factor table of observed levels, in standard order.
#[derive(Debug, Clone)]
pub struct DesignTable {
    symbols: Vec<String>,
    cells: Array2<Option<Level>>,
}

impl DesignTable {
    /// Number of runs (rows).
    #[must_use]
    pub fn runs(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of factors (columns).
    #[must_use]
    pub fn factors(&self) -> usize {
        self.cells.ncols()
    }

    /// Factor symbols, in column order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Level observed for `factor` in `run`.
    #[must_use]
    pub fn get(&self, run: usize, factor: usize) -> Option<&Level> {
        self.cells.get((run, factor)).and_then(Option::as_ref)
    }

    /// Column view for one factor.
    #[must_use]
    pub fn column(&self, factor: usize) -> ArrayView1<'_, Option<Level>> {
        self.cells.column(factor)
    }

    /// Sorted distinct levels observed for `factor`.
    #[must_use]
    pub fn levels(&self, factor: usize) -> Vec<Level> {
        let mut levels: Vec<Level> = self.column(factor).iter().flatten().cloned().collect();
        levels.sort();
        levels.dedup();
        levels
    }
}

/// Run × response table of observed values, in standard order.
#[derive(Debug, Clone)]
pub struct ResponseTable {
    names: Vec<String>,
    cells: Array2<Option<f64>>,
}

impl ResponseTable {
    /// Response names, in column order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column index of a response by name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All values of one response, `None` where a run lacks it.
    #[must_use]
    pub fn column(&self, response: usize) -> Vec<Option<f64>> {
        self.cells.column(response).to_vec()
    }
}

/// Validated, aligned experiment data.
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Factors ordered by ordinal.
    pub factors: Vec<Factor>,
    /// Responses ordered by ordinal.
    pub responses: Vec<ResponseVariable>,
    /// Included runs in ascending standard order.
    pub runs: Vec<Run>,
    /// Factor levels per run.
    pub design: DesignTable,
    /// Response values per run.
    pub responses_table: ResponseTable,
}

impl PreparedData {
    /// Number of included runs.
    #[must_use]
    pub fn num_runs(&self) -> usize {
        self.runs.len()
    }

    /// Values of the named response, aligned with [`PreparedData::runs`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResponse`] if no response has that name.
    pub fn response_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.responses_table
            .index_of(name)
            .map(|idx| self.responses_table.column(idx))
            .ok_or_else(|| Error::UnknownResponse {
                name: name.to_string(),
            })
    }
}

/// Check that an experiment has enough data to be analyzed.
///
/// Checks run in order, each failing with its own error: no runs, no
/// factors, no responses, no complete run, fewer than 2^k complete runs.
///
/// # Errors
///
/// Returns the validation error for the first failed check.
pub fn validate(experiment: &Experiment) -> Result<()> {
    let runs = experiment.included_runs();
    if runs.is_empty() {
        return Err(Error::NoRuns);
    }
    if experiment.factors.is_empty() {
        return Err(Error::NoFactors);
    }
    if experiment.responses.is_empty() {
        return Err(Error::NoResponses);
    }

    let complete = runs
        .iter()
        .filter(|r| r.is_complete(&experiment.responses))
        .count();
    if complete == 0 {
        return Err(Error::NoCompleteRuns);
    }

    let k = u32::try_from(experiment.factors.len()).unwrap_or(u32::MAX);
    let required = 2_usize.checked_pow(k).unwrap_or(usize::MAX);
    if complete < required {
        return Err(Error::InsufficientRuns {
            required,
            actual: complete,
        });
    }
    Ok(())
}

/// Validate an experiment and build its design and response tables.
///
/// # Errors
///
/// Returns a validation error from [`validate`], or
/// [`Error::NonNumericFactorValue`] when a quantitative factor carries a
/// label that does not parse as a number.
pub fn prepare(experiment: &Experiment) -> Result<PreparedData> {
    validate(experiment)?;

    let factors = experiment.ordered_factors();
    let responses = experiment.ordered_responses();
    let runs = experiment.included_runs();

    let mut design_cells = Vec::with_capacity(runs.len() * factors.len());
    let mut response_cells = Vec::with_capacity(runs.len() * responses.len());

    for run in &runs {
        for factor in &factors {
            design_cells.push(factor_cell(factor, run)?);
        }
        for response in &responses {
            response_cells.push(run.response_values.get(&response.id).copied());
        }
    }

    let design = DesignTable {
        symbols: factors.iter().map(|f| f.symbol.clone()).collect(),
        cells: Array2::from_shape_vec((runs.len(), factors.len()), design_cells)
            .map_err(|e| Error::model_fit(format!("design table shape: {e}")))?,
    };
    let responses_table = ResponseTable {
        names: responses.iter().map(|r| r.name.clone()).collect(),
        cells: Array2::from_shape_vec((runs.len(), responses.len()), response_cells)
            .map_err(|e| Error::model_fit(format!("response table shape: {e}")))?,
    };

    debug!(
        runs = runs.len(),
        factors = factors.len(),
        responses = responses.len(),
        "prepared experiment tables"
    );

    Ok(PreparedData {
        factors,
        responses,
        runs,
        design,
        responses_table,
    })
}

fn factor_cell(factor: &Factor, run: &Run) -> Result<Option<Level>> {
    let Some(level) = run.factor_values.get(&factor.id) else {
        return Ok(None);
    };
    match factor.kind {
        FactorKind::Categorical => Ok(Some(level.clone())),
        FactorKind::Quantitative => level
            .to_number()
            .map(|v| Some(Level::Number(v)))
            .ok_or_else(|| Error::NonNumericFactorValue {
                symbol: factor.symbol.clone(),
                standard_order: run.standard_order,
            }),
    }
}
