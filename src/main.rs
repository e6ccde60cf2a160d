//! stackreg - Main Entry Point
//!
//! Runs the full stacked-regression experiment against a CSV dataset.

use clap::Parser;
use std::path::PathBuf;

use stackreg::candidates::default_candidates;
use stackreg::config::ExperimentConfig;
use stackreg::data::{dataframe_to_matrix, load_csv, train_test_split};
use stackreg::experiment::{
    build_regression_ensemble, report_test_metrics, report_training_metrics, score_ensemble,
};

/// Stacked regression experiment driver
#[derive(Parser, Debug)]
#[command(name = "stackreg", version, about)]
struct Cli {
    /// Path to the CSV dataset (header row required)
    #[arg(long)]
    data: PathBuf,

    /// Name of the target column
    #[arg(long)]
    target: String,

    /// Number of cross-validation folds
    #[arg(long, default_value_t = 5)]
    cv_folds: usize,

    /// Fraction of samples held out for final validation
    #[arg(long, default_value_t = 0.2)]
    test_split: f64,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory for metric archives
    #[arg(long, default_value = "npz")]
    output_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stackreg=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = ExperimentConfig::new(cli.cv_folds)
        .with_seed(cli.seed)
        .with_output_dir(&cli.output_dir);

    tracing::info!(data = %cli.data.display(), target = %cli.target, "loading dataset");
    let df = load_csv(&cli.data)?;
    let (x, y) = dataframe_to_matrix(&df, &cli.target)?;
    let (x_train, x_test, y_train, y_test) =
        train_test_split(&x, &y, cli.test_split, cli.seed)?;
    tracing::info!(
        train_samples = x_train.nrows(),
        test_samples = x_test.nrows(),
        features = x_train.ncols(),
        "dataset split"
    );

    let mut ensemble =
        build_regression_ensemble(&x_train, &y_train, &default_candidates(), &config)?;

    let train_scores = score_ensemble(&ensemble, &x_train, &y_train, &config)?;
    report_training_metrics(&train_scores, &config)?;

    ensemble.fit(&x_train, &y_train)?;
    let predictions = ensemble.predict(&x_test)?;
    report_test_metrics(&y_test, &predictions, &config)?;

    Ok(())
}
