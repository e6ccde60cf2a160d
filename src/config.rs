//! Experiment configuration

use crate::error::{Result, StackRegError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a regression experiment run.
///
/// Passed explicitly into every stage; there is no global argument object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of cross-validation folds (grid search and ensemble scoring)
    pub cv_folds: usize,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Directory for serialized metric archives
    pub output_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            cv_folds: 5,
            seed: 42,
            output_dir: PathBuf::from("npz"),
        }
    }
}

impl ExperimentConfig {
    /// Create a config with the given fold count
    pub fn new(cv_folds: usize) -> Self {
        Self {
            cv_folds,
            ..Default::default()
        }
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the archive output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.cv_folds < 2 {
            return Err(StackRegError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExperimentConfig::default();
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_folds() {
        let config = ExperimentConfig::new(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = ExperimentConfig::new(3).with_seed(7).with_output_dir("out");
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }
}
