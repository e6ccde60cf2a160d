//! Base regressor candidates
//!
//! The fixed roster of tunable regressors that feed the stacked ensemble,
//! each paired with its hyperparameter grid and a builder.

use crate::error::{Result, StackRegError};
use crate::search::{ParamGrid, ParamSet};
use crate::training::{
    GradientBoostingConfig, GradientBoostingRegressor, Kernel, RandomForestRegressor, Regressor,
    Svr, SvrConfig,
};

/// Builds a model from a parameter set and a seed. A plain fn pointer so
/// candidates stay `Copy`-friendly and can be captured by stacking factories.
pub type BuilderFn = fn(&ParamSet, u64) -> Result<Box<dyn Regressor>>;

/// A named regressor with its search grid
#[derive(Clone)]
pub struct Candidate {
    /// Display name, also the key under which its score is archived
    pub name: &'static str,
    /// Hyperparameter grid to search over
    pub grid: ParamGrid,
    builder: BuilderFn,
}

impl Candidate {
    pub fn new(name: &'static str, grid: ParamGrid, builder: BuilderFn) -> Self {
        Self {
            name,
            grid,
            builder,
        }
    }

    /// Instantiate an unfitted model for the given parameters
    pub fn build(&self, params: &ParamSet, seed: u64) -> Result<Box<dyn Regressor>> {
        (self.builder)(params, seed)
    }

    /// The raw builder, for callers that need to re-instantiate later
    pub fn builder(&self) -> BuilderFn {
        self.builder
    }
}

fn build_svr(params: &ParamSet, _seed: u64) -> Result<Box<dyn Regressor>> {
    let mut config = SvrConfig::default();

    if let Some(value) = params.get("kernel") {
        let name = value.as_str().ok_or_else(|| {
            StackRegError::SearchError("SVR kernel parameter must be a string".to_string())
        })?;
        config.kernel = match name {
            "linear" => Kernel::Linear,
            "rbf" => Kernel::Rbf { gamma: None },
            other => {
                return Err(StackRegError::SearchError(format!(
                    "unknown SVR kernel '{}'",
                    other
                )))
            }
        };
    }

    if let Some(value) = params.get("C") {
        config.c = value.as_float().ok_or_else(|| {
            StackRegError::SearchError("SVR C parameter must be numeric".to_string())
        })?;
    }

    Ok(Box::new(Svr::new(config)))
}

fn build_random_forest(params: &ParamSet, seed: u64) -> Result<Box<dyn Regressor>> {
    let n_estimators = match params.get("n_estimators") {
        Some(value) => value.as_int().ok_or_else(|| {
            StackRegError::SearchError(
                "random forest n_estimators parameter must be an integer".to_string(),
            )
        })? as usize,
        None => 100,
    };

    Ok(Box::new(
        RandomForestRegressor::new(n_estimators).with_random_state(seed),
    ))
}

fn build_gradient_boosting(_params: &ParamSet, seed: u64) -> Result<Box<dyn Regressor>> {
    let config = GradientBoostingConfig {
        random_state: Some(seed),
        ..Default::default()
    };
    Ok(Box::new(GradientBoostingRegressor::new(config)))
}

/// The default candidate roster, in evaluation order
pub fn default_candidates() -> Vec<Candidate> {
    vec![
        Candidate::new(
            "SVR",
            ParamGrid::new()
                .with_strs("kernel", &["linear", "rbf"])
                .with_floats("C", &[0.1, 1.0, 10.0]),
            build_svr,
        ),
        Candidate::new(
            "Random Forest",
            ParamGrid::new().with_ints("n_estimators", &[100, 200, 500]),
            build_random_forest,
        ),
        Candidate::new("Gradient Boosting Regressor", ParamGrid::new(), build_gradient_boosting),
    ]
}

/// Check a roster is usable: non-empty with unique names
pub fn validate_candidates(candidates: &[Candidate]) -> Result<()> {
    if candidates.is_empty() {
        return Err(StackRegError::ConfigError(
            "candidate roster is empty".to_string(),
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for candidate in candidates {
        if !seen.insert(candidate.name) {
            return Err(StackRegError::ConfigError(format!(
                "duplicate candidate name '{}'",
                candidate.name
            )));
        }
    }

    Ok(())
}
