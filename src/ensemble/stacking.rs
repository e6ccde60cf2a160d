//! Stacked regression ensemble
//!
//! Base regressors produce out-of-fold predictions over seeded k-fold
//! splits; a meta-learner is trained on the resulting meta-feature matrix.
//! At inference the per-fold base models are averaged before the
//! meta-learner combines them.

use crate::error::{Result, StackRegError};
use crate::training::cross_validation::{CVStrategy, CrossValidator};
use crate::training::Regressor;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Builds a fitted model from training data. Shared so a stacking ensemble
/// can be re-instantiated unfitted for cross-validating the whole stack.
pub type RegressorFactory =
    Arc<dyn Fn(&Array2<f64>, &Array1<f64>) -> Result<Box<dyn Regressor>> + Send + Sync>;

/// Configuration for the stacking ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackingConfig {
    /// Number of cross-validation folds for out-of-fold predictions
    pub n_folds: usize,
    /// Whether to include original features in meta-learner input
    pub passthrough: bool,
    /// Random seed for the fold splitter
    pub seed: u64,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            n_folds: 5,
            passthrough: false,
            seed: 42,
        }
    }
}

/// Stacking regressor
pub struct StackingRegressor {
    config: StackingConfig,
    /// Named base model factories, in meta-feature column order
    base_factories: Vec<(String, RegressorFactory)>,
    /// Fitted base models, one inner vec per base learner (one model per fold)
    fitted_base_models: Option<Vec<Vec<Box<dyn Regressor>>>>,
    meta_factory: Option<RegressorFactory>,
    fitted_meta_learner: Option<Box<dyn Regressor>>,
}

impl StackingRegressor {
    /// Create a new stacking regressor
    pub fn new(config: StackingConfig) -> Self {
        Self {
            config,
            base_factories: Vec::new(),
            fitted_base_models: None,
            meta_factory: None,
            fitted_meta_learner: None,
        }
    }

    /// Add a named base model
    pub fn add_base_model(mut self, name: impl Into<String>, factory: RegressorFactory) -> Self {
        self.base_factories.push((name.into(), factory));
        self
    }

    /// Set the meta-learner
    pub fn with_meta_learner(mut self, factory: RegressorFactory) -> Self {
        self.meta_factory = Some(factory);
        self
    }

    /// Names of the base models, in meta-feature column order
    pub fn base_names(&self) -> Vec<&str> {
        self.base_factories.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// A fresh unfitted ensemble with the same configuration and factories
    pub fn unfitted_clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            base_factories: self.base_factories.clone(),
            fitted_base_models: None,
            meta_factory: self.meta_factory.clone(),
            fitted_meta_learner: None,
        }
    }

    fn meta_feature_cols(&self, n_features: usize) -> usize {
        if self.config.passthrough {
            self.base_factories.len() + n_features
        } else {
            self.base_factories.len()
        }
    }

    /// Fit the stacking ensemble
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if self.base_factories.is_empty() {
            return Err(StackRegError::ValidationError(
                "no base models provided".to_string(),
            ));
        }
        let meta_factory = self.meta_factory.as_ref().ok_or_else(|| {
            StackRegError::ValidationError("no meta-learner provided".to_string())
        })?;

        let n_samples = x.nrows();
        let n_base = self.base_factories.len();

        let cv = CrossValidator::new(CVStrategy::KFold {
            n_splits: self.config.n_folds,
            shuffle: true,
        })
        .with_random_state(self.config.seed);
        let splits = cv.split(n_samples, None)?;

        let mut meta_features = Array2::zeros((n_samples, self.meta_feature_cols(x.ncols())));
        let mut fitted_models: Vec<Vec<Box<dyn Regressor>>> =
            (0..n_base).map(|_| Vec::new()).collect();

        for (base_idx, (name, factory)) in self.base_factories.iter().enumerate() {
            tracing::debug!(base = %name, "fitting stacked base model");

            for split in &splits {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train: Array1<f64> =
                    Array1::from_vec(split.train_indices.iter().map(|&i| y[i]).collect());
                let x_val = x.select(Axis(0), &split.test_indices);

                let model = factory(&x_train, &y_train)?;
                let predictions = model.predict(&x_val)?;

                for (local_idx, &global_idx) in split.test_indices.iter().enumerate() {
                    meta_features[[global_idx, base_idx]] = predictions[local_idx];
                }

                fitted_models[base_idx].push(model);
            }
        }

        if self.config.passthrough {
            for i in 0..n_samples {
                for j in 0..x.ncols() {
                    meta_features[[i, n_base + j]] = x[[i, j]];
                }
            }
        }

        let meta_learner = meta_factory(&meta_features, y)?;

        self.fitted_base_models = Some(fitted_models);
        self.fitted_meta_learner = Some(meta_learner);

        Ok(())
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fitted_models = self
            .fitted_base_models
            .as_ref()
            .ok_or(StackRegError::ModelNotFitted)?;
        let meta_learner = self
            .fitted_meta_learner
            .as_ref()
            .ok_or(StackRegError::ModelNotFitted)?;

        let n_samples = x.nrows();
        let n_base = fitted_models.len();
        let mut meta_features = Array2::zeros((n_samples, self.meta_feature_cols(x.ncols())));

        for (base_idx, fold_models) in fitted_models.iter().enumerate() {
            let mut sum_preds: Array1<f64> = Array1::zeros(n_samples);
            for model in fold_models {
                let preds = model.predict(x)?;
                sum_preds = sum_preds + preds;
            }
            let avg_preds = sum_preds / fold_models.len() as f64;

            for i in 0..n_samples {
                meta_features[[i, base_idx]] = avg_preds[i];
            }
        }

        if self.config.passthrough {
            for i in 0..n_samples {
                for j in 0..x.ncols() {
                    meta_features[[i, n_base + j]] = x[[i, j]];
                }
            }
        }

        meta_learner.predict(&meta_features)
    }
}

impl Regressor for StackingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        StackingRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        StackingRegressor::predict(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::RandomForestRegressor;

    fn forest_factory(n: usize, seed: u64) -> RegressorFactory {
        Arc::new(move |x: &Array2<f64>, y: &Array1<f64>| {
            let mut model = RandomForestRegressor::new(n).with_random_state(seed);
            model.fit(x, y)?;
            Ok(Box::new(model) as Box<dyn Regressor>)
        })
    }

    fn toy_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((40, 1), (0..40).map(|i| i as f64).collect()).unwrap();
        let y: Array1<f64> = x.column(0).iter().map(|v| v * 2.0 + 3.0).collect();
        (x, y)
    }

    #[test]
    fn test_fit_and_predict() {
        let (x, y) = toy_data();

        let mut stack = StackingRegressor::new(StackingConfig {
            n_folds: 3,
            ..Default::default()
        })
        .add_base_model("forest-a", forest_factory(10, 1))
        .add_base_model("forest-b", forest_factory(10, 2))
        .with_meta_learner(forest_factory(10, 3));

        stack.fit(&x, &y).unwrap();
        let predictions = stack.predict(&x).unwrap();
        assert_eq!(predictions.len(), x.nrows());

        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        assert!(mse < y.var(0.0), "stack should beat predicting the mean");
    }

    #[test]
    fn test_fit_without_base_models_fails() {
        let (x, y) = toy_data();
        let mut stack =
            StackingRegressor::new(StackingConfig::default()).with_meta_learner(forest_factory(5, 1));
        assert!(stack.fit(&x, &y).is_err());
    }

    #[test]
    fn test_fit_without_meta_learner_fails() {
        let (x, y) = toy_data();
        let mut stack = StackingRegressor::new(StackingConfig::default())
            .add_base_model("forest", forest_factory(5, 1));
        assert!(stack.fit(&x, &y).is_err());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let stack = StackingRegressor::new(StackingConfig::default());
        let x = Array2::zeros((2, 1));
        assert!(matches!(
            stack.predict(&x),
            Err(StackRegError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_unfitted_clone_preserves_structure() {
        let stack = StackingRegressor::new(StackingConfig {
            n_folds: 4,
            ..Default::default()
        })
        .add_base_model("a", forest_factory(5, 1))
        .add_base_model("b", forest_factory(5, 2))
        .with_meta_learner(forest_factory(5, 3));

        let clone = stack.unfitted_clone();
        assert_eq!(clone.base_names(), vec!["a", "b"]);
        assert!(clone.fitted_base_models.is_none());

        let (x, y) = toy_data();
        let mut clone = clone;
        clone.fit(&x, &y).unwrap();
        assert!(clone.predict(&x).is_ok());
    }
}
