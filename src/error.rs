//! Error types for the doe-engine library.
//!
//! This module provides error handling using the `thiserror` crate. Errors
//! fall into two kinds: validation errors, which the caller can fix by
//! correcting the experiment data, and computation errors, raised when model
//! fitting or a statistical routine itself fails.

use thiserror::Error;

/// Which side of the engine an [`Error`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or insufficient input data.
    Validation,
    /// Internal failure while fitting a model or computing a statistic.
    Computation,
}

/// The main error type for the doe-engine library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============ Validation Errors ============
    /// The experiment has no (non-excluded) runs.
    #[error("experiment has no runs")]
    NoRuns,

    /// The experiment has no factors.
    #[error("experiment has no factors")]
    NoFactors,

    /// The experiment has no response variables.
    #[error("experiment has no response variables")]
    NoResponses,

    /// Runs exist but none has every response filled.
    #[error("no run has all responses filled")]
    NoCompleteRuns,

    /// Fewer complete runs than a 2^k full factorial needs.
    #[error("insufficient complete runs: required {required}, actual {actual}")]
    InsufficientRuns {
        /// Minimum number of complete runs (2^k).
        required: usize,
        /// Number of complete runs found.
        actual: usize,
    },

    /// The requested response variable does not exist.
    #[error("response variable '{name}' not found")]
    UnknownResponse {
        /// The requested name.
        name: String,
    },

    /// A quantitative factor carries a value that is not a number.
    #[error("factor '{symbol}' is quantitative but run {standard_order} has a non-numeric value")]
    NonNumericFactorValue {
        /// Symbol of the offending factor.
        symbol: String,
        /// Standard order of the offending run.
        standard_order: i64,
    },

    /// Invalid builder or configuration parameters.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    // ============ Computation Errors ============
    /// The model matrix has no usable column or no usable observation.
    #[error("singular model: {message}")]
    SingularModel {
        /// Description of the degeneracy.
        message: String,
    },

    /// Model fitting failed.
    #[error("model fit failed: {message}")]
    ModelFit {
        /// Description of why the fit failed.
        message: String,
    },

    /// A statistical routine could not be evaluated.
    #[error("statistic failed: {message}")]
    Statistic {
        /// Description of the failure.
        message: String,
    },
}

/// A specialized `Result` type for doe-engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a new `SingularModel` error.
    #[must_use]
    pub fn singular(message: impl Into<String>) -> Self {
        Self::SingularModel {
            message: message.into(),
        }
    }

    /// Create a new `ModelFit` error.
    #[must_use]
    pub fn model_fit(message: impl Into<String>) -> Self {
        Self::ModelFit {
            message: message.into(),
        }
    }

    /// Create a new `Statistic` error.
    #[must_use]
    pub fn statistic(message: impl Into<String>) -> Self {
        Self::Statistic {
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoRuns
            | Self::NoFactors
            | Self::NoResponses
            | Self::NoCompleteRuns
            | Self::InsufficientRuns { .. }
            | Self::UnknownResponse { .. }
            | Self::NonNumericFactorValue { .. }
            | Self::InvalidParams { .. } => ErrorKind::Validation,
            Self::SingularModel { .. } | Self::ModelFit { .. } | Self::Statistic { .. } => {
                ErrorKind::Computation
            }
        }
    }

    /// Whether the caller can recover by fixing the experiment data.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
