//! End-to-end regression experiment
//!
//! Tunes each candidate regressor with grid search, archives their best
//! cross-validated R2 scores, assembles the tuned models into a stacked
//! ensemble, and reports training and validation metrics.

use crate::archive::{ScalarArchive, MODEL_SCORES_FILE, TEST_METRICS_FILE, TRAIN_METRICS_FILE};
use crate::candidates::{validate_candidates, Candidate};
use crate::config::ExperimentConfig;
use crate::ensemble::{RegressorFactory, StackingConfig, StackingRegressor};
use crate::error::Result;
use crate::metrics::RegressionScores;
use crate::report;
use crate::search::GridSearchCv;
use crate::training::cross_validation::{CVStrategy, CrossValidator};
use crate::training::{RandomForestRegressor, Regressor};
use ndarray::{Array1, Array2, Axis};
use std::sync::Arc;

/// Tune every candidate, archive their best R2 scores, and build the
/// stacked ensemble with an untuned random forest as the combiner.
///
/// The returned ensemble is unfitted; callers decide what data it is
/// finally trained on.
pub fn build_regression_ensemble(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    candidates: &[Candidate],
    config: &ExperimentConfig,
) -> Result<StackingRegressor> {
    config.validate()?;
    validate_candidates(candidates)?;

    report::section("Regressors");

    let mut scores = ScalarArchive::new();
    let mut ensemble = StackingRegressor::new(StackingConfig {
        n_folds: config.cv_folds,
        passthrough: false,
        seed: config.seed,
    });

    for candidate in candidates {
        tracing::info!(
            model = candidate.name,
            combinations = candidate.grid.n_combinations(),
            "tuning candidate"
        );

        let searcher = GridSearchCv::new(config.cv_folds).with_seed(config.seed);
        let builder = candidate.builder();
        let seed = config.seed;
        let outcome = searcher.run(
            &candidate.grid,
            |params| builder(params, seed),
            x_train,
            y_train,
        )?;

        report::model_score(candidate.name, outcome.best_score);
        scores.insert(candidate.name, outcome.best_score);

        // The tuned configuration is rebuilt and refitted per stacking fold
        let best_params = outcome.best_params.clone();
        let factory: RegressorFactory = Arc::new(move |x, y| {
            let mut model = builder(&best_params, seed)?;
            model.fit(x, y)?;
            Ok(model)
        });
        ensemble = ensemble.add_base_model(candidate.name, factory);
    }

    let archive_path = config.output_dir.join(MODEL_SCORES_FILE);
    scores.save(&archive_path)?;
    tracing::info!(path = %archive_path.display(), "archived model scores");

    // The combiner stays untuned: a plain random forest is stable enough
    // even when it is not the strongest base model.
    let meta_seed = config.seed;
    let meta: RegressorFactory = Arc::new(move |x, y| {
        let mut model = RandomForestRegressor::new(100).with_random_state(meta_seed);
        model.fit(x, y)?;
        Ok(Box::new(model) as Box<dyn Regressor>)
    });

    Ok(ensemble.with_meta_learner(meta))
}

/// Cross-validate the whole ensemble and average MSE, MAE, and R2 over
/// the folds.
pub fn score_ensemble(
    ensemble: &StackingRegressor,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    config: &ExperimentConfig,
) -> Result<RegressionScores> {
    config.validate()?;

    let cv = CrossValidator::new(CVStrategy::KFold {
        n_splits: config.cv_folds,
        shuffle: true,
    })
    .with_random_state(config.seed);
    let splits = cv.split(x_train.nrows(), None)?;

    let mut fold_scores = Vec::with_capacity(splits.len());

    for split in &splits {
        let x_fold_train = x_train.select(Axis(0), &split.train_indices);
        let y_fold_train: Array1<f64> =
            Array1::from_vec(split.train_indices.iter().map(|&i| y_train[i]).collect());
        let x_fold_test = x_train.select(Axis(0), &split.test_indices);
        let y_fold_test: Array1<f64> =
            Array1::from_vec(split.test_indices.iter().map(|&i| y_train[i]).collect());

        let mut fold_model = ensemble.unfitted_clone();
        fold_model.fit(&x_fold_train, &y_fold_train)?;
        let predictions = fold_model.predict(&x_fold_test)?;

        let scores = RegressionScores::compute(&y_fold_test, &predictions)?;
        tracing::debug!(fold = split.fold_idx, r2 = scores.r2, "ensemble fold scored");
        fold_scores.push(scores);
    }

    RegressionScores::mean_of(&fold_scores)
}

/// Print the cross-validated training metrics and archive them.
pub fn report_training_metrics(
    scores: &RegressionScores,
    config: &ExperimentConfig,
) -> Result<()> {
    report::section("[Regressor] Training");
    report::metric("MSE", scores.mse);
    report::metric("MAE", scores.mae);
    report::metric("R2", scores.r2);

    let archive: ScalarArchive = [
        ("train_mse".to_string(), scores.mse),
        ("train_mae".to_string(), scores.mae),
        ("train_r2".to_string(), scores.r2),
    ]
    .into_iter()
    .collect();
    archive.save(&config.output_dir.join(TRAIN_METRICS_FILE))?;

    Ok(())
}

/// Compute held-out metrics from predictions, print them, archive them,
/// and return them.
pub fn report_test_metrics(
    y_test: &Array1<f64>,
    y_pred: &Array1<f64>,
    config: &ExperimentConfig,
) -> Result<RegressionScores> {
    let scores = RegressionScores::compute(y_test, y_pred)?;

    report::section("[Regressor] Validation");
    report::metric("MSE", scores.mse);
    report::metric("MAE", scores.mae);
    report::metric("R2", scores.r2);

    let archive: ScalarArchive = [
        ("test_mse".to_string(), scores.mse),
        ("test_mae".to_string(), scores.mae),
        ("test_r2".to_string(), scores.r2),
    ]
    .into_iter()
    .collect();
    archive.save(&config.output_dir.join(TEST_METRICS_FILE))?;

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::default_candidates;
    use crate::search::ParamGrid;
    use std::path::PathBuf;

    fn temp_output_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("stackreg_experiment_{}_{}", tag, std::process::id()))
    }

    fn toy_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec(
            (n, 2),
            (0..n * 2).map(|i| (i as f64) * 0.25).collect(),
        )
        .unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| row[0] * 1.5 - row[1] * 0.5 + 2.0)
            .collect();
        (x, y)
    }

    fn fast_candidates() -> Vec<Candidate> {
        vec![
            Candidate::new(
                "Random Forest",
                ParamGrid::new().with_ints("n_estimators", &[5, 10]),
                |params, seed| {
                    let n = params
                        .get("n_estimators")
                        .and_then(|v| v.as_int())
                        .unwrap_or(10) as usize;
                    Ok(Box::new(RandomForestRegressor::new(n).with_random_state(seed)))
                },
            ),
        ]
    }

    #[test]
    fn test_build_writes_model_scores_archive() {
        let (x, y) = toy_data(30);
        let output_dir = temp_output_dir("build");
        let config = ExperimentConfig::new(3).with_output_dir(&output_dir);

        let ensemble =
            build_regression_ensemble(&x, &y, &fast_candidates(), &config).unwrap();
        assert_eq!(ensemble.base_names(), vec!["Random Forest"]);

        let archive = ScalarArchive::load(&output_dir.join(MODEL_SCORES_FILE)).unwrap();
        assert_eq!(archive.keys().collect::<Vec<_>>(), vec!["Random Forest"]);
        assert!(archive.get("Random Forest").unwrap() <= 1.0);

        std::fs::remove_dir_all(&output_dir).ok();
    }

    #[test]
    fn test_score_then_fit_then_report() {
        let (x, y) = toy_data(30);
        let output_dir = temp_output_dir("full");
        let config = ExperimentConfig::new(3).with_output_dir(&output_dir);

        let mut ensemble =
            build_regression_ensemble(&x, &y, &fast_candidates(), &config).unwrap();

        let train_scores = score_ensemble(&ensemble, &x, &y, &config).unwrap();
        report_training_metrics(&train_scores, &config).unwrap();

        ensemble.fit(&x, &y).unwrap();
        let predictions = ensemble.predict(&x).unwrap();
        let test_scores = report_test_metrics(&y, &predictions, &config).unwrap();
        assert!(test_scores.r2 <= 1.0);

        let train_archive = ScalarArchive::load(&output_dir.join(TRAIN_METRICS_FILE)).unwrap();
        assert_eq!(
            train_archive.keys().collect::<Vec<_>>(),
            vec!["train_mae", "train_mse", "train_r2"]
        );
        let test_archive = ScalarArchive::load(&output_dir.join(TEST_METRICS_FILE)).unwrap();
        assert_eq!(
            test_archive.keys().collect::<Vec<_>>(),
            vec!["test_mae", "test_mse", "test_r2"]
        );

        std::fs::remove_dir_all(&output_dir).ok();
    }

    #[test]
    fn test_build_rejects_empty_roster() {
        let (x, y) = toy_data(20);
        let config = ExperimentConfig::new(3);
        assert!(build_regression_ensemble(&x, &y, &[], &config).is_err());
    }

    #[test]
    fn test_default_roster_is_valid() {
        validate_candidates(&default_candidates()).unwrap();
    }
}
