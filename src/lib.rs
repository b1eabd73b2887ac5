//! # doe-engine
//!
//! Statistical analysis of factorial designed experiments.
//!
//! ## Overview
//!
//! Given an experiment (factors, response variables and runs) the engine
//! computes, on demand and without persistence:
//! - **ANOVA**: Type II sums of squares over an all-categorical model with
//!   every two-factor interaction
//! - **Regression**: mixed continuous/categorical model with a readable equation
//! - **Effects**: main and two-factor interaction effects from level/cell means
//! - **Residual diagnostics**: Shapiro-Wilk normality and Durbin-Watson
//!   autocorrelation
//! - **Sign table**: coded contrast matrix over every interaction order with
//!   Yates effects and percent contributions
//! - **Plot data**: Pareto, main-effect and interaction plots
//!
//! Every result leaves the engine as a [`value::ResultValue`] tree with all
//! non-finite numbers replaced by null, safe for JSON interchange.
//!
//! ## Quick Start
//!
//! ```rust
//! use doe_engine::prelude::*;
//!
//! let factors = vec![
//!     Factor::quantitative(1, "Temperature", "T", &[150.0, 200.0]),
//!     Factor::categorical(2, "Catalyst", "K", &["A", "B"]),
//! ];
//! let mut exp = Experiment::new(1, "Yield study");
//! exp.factors = factors.clone();
//! exp.responses = vec![ResponseVariable::new(1, "Yield", "%")];
//! exp.runs = FullFactorialBuilder::new()
//!     .factors(&factors)
//!     .replicates(2)
//!     .build()
//!     .unwrap();
//! for (run, y) in exp.runs.iter_mut().zip([60.0, 72.0, 61.0, 70.0, 80.0, 91.0, 79.0, 93.0]) {
//!     run.response_values.insert(1, y);
//! }
//!
//! let result = analyze(&exp, &AnalysisConfig::default()).unwrap();
//! assert_eq!(result.anova.row("Total").map(|r| r.df), Some(7));
//! let json = result.to_json().unwrap();
//! assert!(!json.contains("NaN"));
//! ```
//!
//! ## Features
//!
//! - `parallel`: Analyze every response of an experiment in parallel using rayon

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod builder;
pub mod doe;
pub mod error;
pub mod experiment;
pub mod value;

#[cfg(feature = "parallel")]
pub mod parallel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::FullFactorialBuilder;
    pub use crate::doe::{
        analyze, analyze_all_responses, analyze_response, AnalysisConfig, AnovaTable, ColumnKind,
        DoeAnalysis, Effects, Regression, ResidualAnalysis, SignTable, ToValue,
    };
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::experiment::{
        DesignType, Experiment, Factor, FactorKind, Level, OptimizationGoal, ResponseVariable, Run,
    };
    pub use crate::value::{sanitize, ResultValue};

    #[cfg(feature = "parallel")]
    pub use crate::parallel::par_analyze_responses;
}

// Re-export commonly used items at crate root
pub use builder::FullFactorialBuilder;
pub use doe::{analyze, analyze_response, AnalysisConfig, DoeAnalysis};
pub use error::{Error, ErrorKind, Result};
pub use value::{sanitize, ResultValue};

#[cfg(feature = "parallel")]
pub use parallel::par_analyze_responses;
