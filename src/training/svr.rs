//! Support-vector regression
//!
//! Epsilon-insensitive SVR with linear and RBF kernels, trained by gradient
//! updates with a convergence tolerance.

use crate::error::{Result, StackRegError};
use crate::training::Regressor;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training returns an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    /// Linear kernel: K(x, y) = x . y
    Linear,
    /// Gaussian kernel: K(x, y) = exp(-gamma * ||x - y||^2).
    /// `gamma = None` resolves to 1 / (n_features * var(x)) at fit time.
    Rbf { gamma: Option<f64> },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Rbf { gamma: None }
    }
}

/// SVR configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvrConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: Kernel,
    /// Epsilon tube width
    pub epsilon: f64,
    /// Tolerance for the stopping criterion
    pub tol: f64,
    /// Maximum number of passes over the data
    pub max_iter: usize,
}

impl Default for SvrConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: Kernel::default(),
            epsilon: 0.1,
            tol: 1e-3,
            max_iter: 1000,
        }
    }
}

/// Support-vector regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Svr {
    config: SvrConfig,
    support_vectors: Option<Array2<f64>>,
    // alpha - alpha*
    alphas: Option<Array1<f64>>,
    bias: f64,
    resolved_gamma: f64,
    is_fitted: bool,
}

impl Default for Svr {
    fn default() -> Self {
        Self::new(SvrConfig::default())
    }
}

impl Svr {
    /// Create a new SVR model
    pub fn new(config: SvrConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            alphas: None,
            bias: 0.0,
            resolved_gamma: 1.0,
            is_fitted: false,
        }
    }

    /// Fit on training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();

        if n != y.len() {
            return Err(StackRegError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n == 0 {
            return Err(StackRegError::ValidationError(
                "cannot fit on zero samples".to_string(),
            ));
        }
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(StackRegError::ValidationError(format!(
                "dataset has {} samples, exceeding the maximum {} for the SVR kernel matrix",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        self.resolved_gamma = self.resolve_gamma(x);

        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut alphas_star: Array1<f64> = Array1::zeros(n);
        let mut bias: f64 = 0.0;

        let kernel_matrix = self.compute_kernel_matrix(x);

        let learning_rate: f64 = 0.01;

        for _iter in 0..self.config.max_iter {
            let mut max_change: f64 = 0.0;

            for i in 0..n {
                let mut pred: f64 = bias;
                for j in 0..n {
                    pred += (alphas[j] - alphas_star[j]) * kernel_matrix[[j, i]];
                }

                let error: f64 = pred - y[i];

                if error > self.config.epsilon {
                    let new_val = (alphas_star[i] + learning_rate).min(self.config.c);
                    max_change = max_change.max((new_val - alphas_star[i]).abs());
                    alphas_star[i] = new_val;
                } else if error < -self.config.epsilon {
                    let new_val = (alphas[i] + learning_rate).min(self.config.c);
                    max_change = max_change.max((new_val - alphas[i]).abs());
                    alphas[i] = new_val;
                }

                let bias_update = learning_rate * 0.1 * error;
                max_change = max_change.max(bias_update.abs());
                bias -= bias_update;
            }

            if max_change < self.config.tol {
                break;
            }
        }

        let combined_alphas = &alphas - &alphas_star;

        let support_indices: Vec<usize> = combined_alphas
            .iter()
            .enumerate()
            .filter(|(_, a)| a.abs() > 1e-8)
            .map(|(i, _)| i)
            .collect();

        if support_indices.is_empty() {
            // Flat solution: keep all points so predict still works
            self.support_vectors = Some(x.clone());
            self.alphas = Some(combined_alphas);
        } else {
            let sv = x.select(ndarray::Axis(0), &support_indices);
            let sv_alphas: Array1<f64> =
                Array1::from_vec(support_indices.iter().map(|&i| combined_alphas[i]).collect());
            self.support_vectors = Some(sv);
            self.alphas = Some(sv_alphas);
        }

        self.bias = bias;
        self.is_fitted = true;

        Ok(())
    }

    /// sklearn's "scale" default: 1 / (n_features * var(x))
    fn resolve_gamma(&self, x: &Array2<f64>) -> f64 {
        match self.config.kernel {
            Kernel::Linear => 0.0,
            Kernel::Rbf { gamma: Some(g) } => g,
            Kernel::Rbf { gamma: None } => {
                let n_features = x.ncols() as f64;
                let var = x.var(0.0);
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0 / n_features
                }
            }
        }
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));

        for i in 0..n {
            for j in i..n {
                let val = self.kernel(&x.row(i).to_owned(), &x.row(j).to_owned());
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }

        k
    }

    fn kernel(&self, x1: &Array1<f64>, x2: &Array1<f64>) -> f64 {
        match self.config.kernel {
            Kernel::Linear => x1.dot(x2),
            Kernel::Rbf { .. } => {
                let diff = x1 - x2;
                let norm_sq = diff.dot(&diff);
                (-self.resolved_gamma * norm_sq).exp()
            }
        }
    }

    /// Predict target values
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(StackRegError::ModelNotFitted);
        }

        let sv = self
            .support_vectors
            .as_ref()
            .ok_or(StackRegError::ModelNotFitted)?;
        let alphas = self.alphas.as_ref().ok_or(StackRegError::ModelNotFitted)?;

        let n = x.nrows();
        let mut predictions = Array1::zeros(n);

        for i in 0..n {
            let sample = x.row(i).to_owned();
            let mut sum = self.bias;
            for j in 0..sv.nrows() {
                sum += alphas[j] * self.kernel(&sample, &sv.row(j).to_owned());
            }
            predictions[i] = sum;
        }

        Ok(predictions)
    }

    /// Number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.as_ref().map(|sv| sv.nrows()).unwrap_or(0)
    }
}

impl Regressor for Svr {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        Svr::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Svr::predict(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_kernel_fits_line() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![2.0, 4.0, 6.0, 8.0, 10.0, 12.0];

        let config = SvrConfig {
            kernel: Kernel::Linear,
            c: 10.0,
            ..Default::default()
        };
        let mut model = Svr::new(config);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        let mae: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).abs())
            .sum::<f64>()
            / y.len() as f64;
        assert!(mae < 2.0, "MAE too high: {}", mae);
    }

    #[test]
    fn test_rbf_gamma_scale_resolution() {
        let x = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];

        let mut model = Svr::new(SvrConfig::default());
        model.fit(&x, &y).unwrap();

        let expected = 1.0 / (2.0 * x.var(0.0));
        assert!((model.resolved_gamma - expected).abs() < 1e-12);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = Svr::default();
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(StackRegError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_deterministic() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut a = Svr::new(SvrConfig { kernel: Kernel::Linear, ..Default::default() });
        let mut b = Svr::new(SvrConfig { kernel: Kernel::Linear, ..Default::default() });
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }
}
