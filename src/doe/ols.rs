//! Ordinary least squares with rank detection.
//!
//! Decompositions are nalgebra's Householder QR. A column whose component
//! orthogonal to the columns before it falls below `tolerance × its norm` is
//! aliased: it is dropped from the fit and its coefficient is reported as
//! `None`. Rank is the number of kept columns.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use super::formula::ModelMatrix;
use crate::error::{Error, Result};

/// A fitted least-squares model.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Column labels, intercept first.
    pub labels: Vec<String>,
    /// Coefficient per column, `None` for aliased columns.
    pub coefficients: Vec<Option<f64>>,
    /// Standard error per column, `None` for aliased columns.
    pub std_errors: Vec<Option<f64>>,
    /// Fitted values.
    pub fitted: Array1<f64>,
    /// Residuals `y − fitted`.
    pub residuals: Array1<f64>,
    /// Number of observations.
    pub n: usize,
    /// Number of estimable columns.
    pub rank: usize,
    /// Residual sum of squares.
    pub sse: f64,
    /// Total sum of squares about the mean.
    pub tss: f64,
}

impl OlsFit {
    /// Residual degrees of freedom, `n − rank`.
    #[must_use]
    pub fn df_resid(&self) -> usize {
        self.n.saturating_sub(self.rank)
    }

    /// Model degrees of freedom, `rank − 1`.
    #[must_use]
    pub fn df_model(&self) -> usize {
        self.rank.saturating_sub(1)
    }

    /// Residual mean square. NaN without residual degrees of freedom.
    #[must_use]
    pub fn mse_resid(&self) -> f64 {
        match self.df_resid() {
            0 => f64::NAN,
            df => self.sse / df as f64,
        }
    }

    /// Coefficient of determination.
    #[must_use]
    pub fn r_squared(&self) -> f64 {
        1.0 - self.sse / self.tss
    }

    /// Adjusted R².
    #[must_use]
    pub fn adj_r_squared(&self) -> f64 {
        match self.df_resid() {
            0 => f64::NAN,
            df => 1.0 - (self.n as f64 - 1.0) / df as f64 * (1.0 - self.r_squared()),
        }
    }

    /// Overall F statistic of the model against the intercept-only model.
    #[must_use]
    pub fn f_statistic(&self) -> f64 {
        match self.df_model() {
            0 => f64::NAN,
            df => ((self.tss - self.sse) / df as f64) / self.mse_resid(),
        }
    }

    /// Gaussian log-likelihood at the least-squares estimate.
    #[must_use]
    pub fn log_likelihood(&self) -> f64 {
        let n = self.n as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.sse / n).ln() + 1.0)
    }

    /// Akaike information criterion.
    #[must_use]
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.rank as f64
    }

    /// Bayesian information criterion.
    #[must_use]
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + self.rank as f64 * (self.n as f64).ln()
    }
}

/// Copy the selected columns of `x` into a nalgebra matrix.
fn columns(x: &Array2<f64>, cols: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(x.nrows(), cols.len(), |i, j| x[[i, cols[j]]])
}

/// Columns of `x` that are not linear combinations of the columns before
/// them, in column order.
///
/// Each candidate is factored together with the columns kept so far; the
/// last diagonal entry of R is the norm of its component orthogonal to them.
fn estimable_columns(x: &Array2<f64>, tolerance: f64) -> Vec<usize> {
    let (n, p) = x.dim();
    let mut kept: Vec<usize> = Vec::with_capacity(p);
    for j in 0..p {
        if kept.len() >= n {
            break;
        }
        let norm0 = x.column(j).dot(&x.column(j)).sqrt();
        if norm0 == 0.0 {
            continue;
        }
        let mut candidate = kept.clone();
        candidate.push(j);
        let r = columns(x, &candidate).qr().r();
        let last = candidate.len() - 1;
        if r[(last, last)].abs() > tolerance * norm0 {
            kept.push(j);
        }
    }
    kept
}

/// Fit `y ~ X` by least squares.
///
/// # Errors
///
/// Returns [`Error::SingularModel`] when the matrix has no rows or columns,
/// or no column is estimable.
pub fn fit(model: &ModelMatrix, tolerance: f64) -> Result<OlsFit> {
    let (n, p) = model.x.dim();
    if n == 0 || p == 0 {
        return Err(Error::singular(format!("empty model matrix ({n} x {p})")));
    }

    let kept = estimable_columns(&model.x, tolerance);
    let rank = kept.len();
    if rank == 0 {
        return Err(Error::singular("model matrix has no estimable column"));
    }

    let qr = columns(&model.x, &kept).qr();
    let q = qr.q();
    let r = qr.r();
    let y = DVector::from_iterator(n, model.y.iter().copied());

    let qty = q.transpose() * &y;
    let beta = r
        .solve_upper_triangular(&qty)
        .ok_or_else(|| Error::singular("triangular factor is not invertible"))?;
    let r_inv = r
        .solve_upper_triangular(&DMatrix::identity(rank, rank))
        .ok_or_else(|| Error::singular("triangular factor is not invertible"))?;

    let fitted = Array1::from_iter((&q * &qty).iter().copied());
    let residuals = &model.y - &fitted;
    let sse = residuals.dot(&residuals);
    let y_mean = model.y.mean().unwrap_or(f64::NAN);
    let tss = model.y.iter().map(|v| (v - y_mean).powi(2)).sum();

    let df_resid = n.saturating_sub(rank);
    let mse = if df_resid == 0 {
        f64::NAN
    } else {
        sse / df_resid as f64
    };

    // Var(b) = mse · R⁻¹ R⁻ᵀ
    let mut coefficients = vec![None; p];
    let mut std_errors = vec![None; p];
    for (i, &col) in kept.iter().enumerate() {
        let var = r_inv.row(i).norm_squared() * mse;
        coefficients[col] = Some(beta[i]);
        std_errors[col] = Some(var.sqrt());
    }

    Ok(OlsFit {
        labels: model.labels.clone(),
        coefficients,
        std_errors,
        fitted,
        residuals,
        n,
        rank,
        sse,
        tss,
    })
}
