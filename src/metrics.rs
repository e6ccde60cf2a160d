//! Regression quality metrics

use crate::error::{Result, StackRegError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// MSE, MAE and R2 for one evaluation of a regressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionScores {
    /// Mean squared error
    pub mse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
}

impl RegressionScores {
    /// Compute metrics from true and predicted values.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(StackRegError::ShapeError {
                expected: format!("y_pred length = {}", y_true.len()),
                actual: format!("y_pred length = {}", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(StackRegError::ValidationError(
                "cannot compute metrics on empty arrays".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();

        // Constant target: ss_tot is zero, define R2 as 0
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Ok(Self { mse, mae, r2 })
    }

    /// Average a set of per-fold scores.
    pub fn mean_of(scores: &[RegressionScores]) -> Result<Self> {
        if scores.is_empty() {
            return Err(StackRegError::ValidationError(
                "cannot average an empty score set".to_string(),
            ));
        }
        let n = scores.len() as f64;
        Ok(Self {
            mse: scores.iter().map(|s| s.mse).sum::<f64>() / n,
            mae: scores.iter().map(|s| s.mae).sum::<f64>() / n,
            r2: scores.iter().map(|s| s.r2).sum::<f64>() / n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_prediction() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        let scores = RegressionScores::compute(&y, &y).unwrap();
        assert_eq!(scores.mse, 0.0);
        assert_eq!(scores.mae, 0.0);
        assert_eq!(scores.r2, 1.0);
    }

    #[test]
    fn test_known_values() {
        let y_true = array![3.0, -0.5, 2.0, 7.0];
        let y_pred = array![2.5, 0.0, 2.0, 8.0];
        let scores = RegressionScores::compute(&y_true, &y_pred).unwrap();
        assert!((scores.mse - 0.375).abs() < 1e-12);
        assert!((scores.mae - 0.5).abs() < 1e-12);
        assert!((scores.r2 - 0.9486081370449679).abs() < 1e-9);
    }

    #[test]
    fn test_constant_target_r2() {
        let y_true = array![2.0, 2.0, 2.0];
        let y_pred = array![1.0, 2.0, 3.0];
        let scores = RegressionScores::compute(&y_true, &y_pred).unwrap();
        assert_eq!(scores.r2, 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        let y_true = array![1.0, 2.0];
        let y_pred = array![1.0];
        assert!(RegressionScores::compute(&y_true, &y_pred).is_err());
    }

    #[test]
    fn test_mean_of_folds() {
        let folds = vec![
            RegressionScores { mse: 1.0, mae: 0.5, r2: 0.8 },
            RegressionScores { mse: 3.0, mae: 1.5, r2: 0.6 },
        ];
        let mean = RegressionScores::mean_of(&folds).unwrap();
        assert!((mean.mse - 2.0).abs() < 1e-12);
        assert!((mean.mae - 1.0).abs() < 1e-12);
        assert!((mean.r2 - 0.7).abs() < 1e-12);
    }
}
