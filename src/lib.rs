//! # stackreg
//!
//! A stacked regression experiment driver: tunes a roster of base
//! regressors with cross-validated grid search, stacks them behind a
//! random-forest combiner, and archives the scores and metrics of every
//! stage.
//!
//! ## Pipeline
//!
//! 1. Load a CSV dataset and split it into train and test partitions.
//! 2. Grid-search each candidate regressor, scoring by cross-validated R2.
//! 3. Archive the per-model best scores, then assemble the tuned models
//!    into a [`ensemble::StackingRegressor`].
//! 4. Cross-validate the whole ensemble and report mean MSE, MAE, and R2.
//! 5. Fit on the full training partition and report held-out metrics.

pub mod archive;
pub mod candidates;
pub mod config;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod report;
pub mod search;
pub mod training;

pub use error::{Result, StackRegError};

/// Commonly used types
pub mod prelude {
    pub use crate::archive::ScalarArchive;
    pub use crate::candidates::{default_candidates, Candidate};
    pub use crate::config::ExperimentConfig;
    pub use crate::ensemble::{StackingConfig, StackingRegressor};
    pub use crate::error::{Result, StackRegError};
    pub use crate::experiment::{
        build_regression_ensemble, report_test_metrics, report_training_metrics, score_ensemble,
    };
    pub use crate::metrics::RegressionScores;
    pub use crate::search::{GridSearchCv, ParamGrid, ParamSet, ParamValue};
    pub use crate::training::{
        GradientBoostingRegressor, RandomForestRegressor, RegressionTree, Regressor, Svr,
    };
}
