//! Regression estimators and cross-validation

pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod random_forest;
pub mod svr;

pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::RegressionTree;
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use random_forest::{MaxFeatures, RandomForestRegressor};
pub use svr::{Kernel, Svr, SvrConfig};

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Common interface for regression estimators.
///
/// Implementors are interchangeable in grid search and stacking, so the
/// trait is object-safe and thread-safe.
pub trait Regressor: Send + Sync {
    /// Fit the estimator on training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict target values for each row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Per-feature importance scores, if the estimator computes them
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}
