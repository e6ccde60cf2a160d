//! Ensemble methods

pub mod stacking;

pub use stacking::{RegressorFactory, StackingConfig, StackingRegressor};
