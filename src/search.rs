//! Hyperparameter grid search
//!
//! Exhaustive search over a parameter grid, scoring each candidate with
//! cross-validated R2 and refitting the best configuration on the full
//! training set.

use crate::error::{Result, StackRegError};
use crate::metrics::RegressionScores;
use crate::training::{CVStrategy, CrossValidator, Regressor};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Str(String),
}

impl ParamValue {
    /// Numeric value, accepting integers as floats
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Str(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One concrete assignment of hyperparameters
pub type ParamSet = BTreeMap<String, ParamValue>;

/// A grid of hyperparameter values to search over
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamGrid {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    /// Create an empty grid. An empty grid expands to a single default
    /// parameter set, so untuned models still go through the search path.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a float-valued parameter
    pub fn with_floats(mut self, name: &str, values: &[f64]) -> Self {
        self.entries.push((
            name.to_string(),
            values.iter().map(|&v| ParamValue::Float(v)).collect(),
        ));
        self
    }

    /// Add an integer-valued parameter
    pub fn with_ints(mut self, name: &str, values: &[i64]) -> Self {
        self.entries.push((
            name.to_string(),
            values.iter().map(|&v| ParamValue::Int(v)).collect(),
        ));
        self
    }

    /// Add a string-valued parameter
    pub fn with_strs(mut self, name: &str, values: &[&str]) -> Self {
        self.entries.push((
            name.to_string(),
            values.iter().map(|&v| ParamValue::Str(v.to_string())).collect(),
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of parameter sets the grid expands to
    pub fn n_combinations(&self) -> usize {
        if self.entries.is_empty() {
            return 1;
        }
        self.entries.iter().map(|(_, v)| v.len()).product()
    }

    /// Cartesian product of all parameter values
    pub fn expand(&self) -> Vec<ParamSet> {
        let mut sets = vec![ParamSet::new()];

        for (name, values) in &self.entries {
            let mut next = Vec::with_capacity(sets.len() * values.len());
            for set in &sets {
                for value in values {
                    let mut expanded = set.clone();
                    expanded.insert(name.clone(), value.clone());
                    next.push(expanded);
                }
            }
            sets = next;
        }

        sets
    }
}

/// Cross-validated score for one parameter set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialScore {
    pub params: ParamSet,
    pub mean_score: f64,
}

/// Result of a completed grid search
pub struct SearchOutcome {
    /// Parameters of the best trial
    pub best_params: ParamSet,
    /// Mean cross-validated R2 of the best trial
    pub best_score: f64,
    /// Best model refitted on the full training set
    pub best_model: Box<dyn Regressor>,
    /// All trials in evaluation order
    pub trials: Vec<TrialScore>,
}

/// Exhaustive grid search with K-fold cross-validation and R2 scoring
pub struct GridSearchCv {
    cv_folds: usize,
    seed: u64,
}

impl GridSearchCv {
    /// Create a searcher with the given fold count
    pub fn new(cv_folds: usize) -> Self {
        Self { cv_folds, seed: 42 }
    }

    /// Set the seed used for fold shuffling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run the search: score every parameter set, pick the best by mean R2,
    /// then refit it on all of `x` and `y`.
    pub fn run<F>(
        &self,
        grid: &ParamGrid,
        build: F,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<SearchOutcome>
    where
        F: Fn(&ParamSet) -> Result<Box<dyn Regressor>>,
    {
        if x.nrows() != y.len() {
            return Err(StackRegError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let cv = CrossValidator::new(CVStrategy::KFold {
            n_splits: self.cv_folds,
            shuffle: true,
        })
        .with_random_state(self.seed);

        // Same splits for every candidate so scores are comparable
        let splits = cv.split(x.nrows(), None)?;

        let param_sets = grid.expand();
        let mut trials = Vec::with_capacity(param_sets.len());
        let mut best_score = f64::NEG_INFINITY;
        let mut best_params: Option<ParamSet> = None;

        for params in param_sets {
            let mut fold_scores = Vec::with_capacity(splits.len());

            for split in &splits {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train: Array1<f64> =
                    Array1::from_vec(split.train_indices.iter().map(|&i| y[i]).collect());
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test: Array1<f64> =
                    Array1::from_vec(split.test_indices.iter().map(|&i| y[i]).collect());

                let mut model = build(&params)?;
                model.fit(&x_train, &y_train)?;
                let predictions = model.predict(&x_test)?;
                let scores = RegressionScores::compute(&y_test, &predictions)?;
                fold_scores.push(scores.r2);
            }

            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            tracing::debug!(?params, mean_score, "grid search trial");

            if mean_score > best_score {
                best_score = mean_score;
                best_params = Some(params.clone());
            }

            trials.push(TrialScore { params, mean_score });
        }

        let best_params = best_params.ok_or_else(|| {
            StackRegError::SearchError("grid expanded to zero parameter sets".to_string())
        })?;

        let mut best_model = build(&best_params)?;
        best_model.fit(x, y)?;

        Ok(SearchOutcome {
            best_params,
            best_score,
            best_model,
            trials,
        })
    }
}
