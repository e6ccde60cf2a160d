//! Data ingestion and splitting
//!
//! CSV files are read through polars and converted into row-major ndarray
//! matrices with an explicit target column.

use crate::error::{Result, StackRegError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;

/// Load a CSV file with a header row.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| StackRegError::DataError(e.to_string()))?;

    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file);

    reader
        .finish()
        .map_err(|e| StackRegError::DataError(e.to_string()))
}

/// Split a DataFrame into a feature matrix and a target vector.
///
/// Every column except `target` becomes a feature, in DataFrame order.
pub fn dataframe_to_matrix(df: &DataFrame, target: &str) -> Result<(Array2<f64>, Array1<f64>)> {
    let feature_cols: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != target)
        .map(|s| s.to_string())
        .collect();

    if feature_cols.is_empty() {
        return Err(StackRegError::DataError(
            "no feature columns besides the target".to_string(),
        ));
    }

    let target_series = df
        .column(target)
        .map_err(|_| StackRegError::ColumnNotFound(target.to_string()))?
        .as_materialized_series()
        .clone();
    let target_f64 = target_series
        .cast(&DataType::Float64)
        .map_err(|e| StackRegError::DataError(e.to_string()))?;
    let y: Array1<f64> = target_f64
        .f64()
        .map_err(|e| StackRegError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();

    let x = columns_to_array2(df, &feature_cols)?;

    Ok((x, y))
}

/// Extract named columns into a row-major `Array2<f64>`.
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| StackRegError::ColumnNotFound(col_name.clone()))?
                .as_materialized_series()
                .clone();
            let series_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| StackRegError::DataError(e.to_string()))?;
            let values: Vec<f64> = series_f64
                .f64()
                .map_err(|e| StackRegError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

/// Seeded shuffled train/test split.
///
/// Returns `(x_train, x_test, y_train, y_test)`.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>, Array1<f64>)> {
    let n = x.nrows();
    if n != y.len() {
        return Err(StackRegError::ShapeError {
            expected: format!("y length = {}", n),
            actual: format!("y length = {}", y.len()),
        });
    }
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(StackRegError::ValidationError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let test_n = ((n as f64 * test_size).round() as usize).clamp(1, n.saturating_sub(1));

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(test_n);

    let x_train = x.select(ndarray::Axis(0), train_idx);
    let x_test = x.select(ndarray::Axis(0), test_idx);
    let y_train: Array1<f64> = Array1::from_vec(train_idx.iter().map(|&i| y[i]).collect());
    let y_test: Array1<f64> = Array1::from_vec(test_idx.iter().map(|&i| y[i]).collect());

    Ok((x_train, x_test, y_train, y_test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_train_test_split_shapes() {
        let x = Array2::from_shape_fn((10, 2), |(r, c)| (r * 2 + c) as f64);
        let y: Array1<f64> = (0..10).map(|i| i as f64).collect();

        let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.3, 42).unwrap();
        assert_eq!(x_train.nrows(), 7);
        assert_eq!(x_test.nrows(), 3);
        assert_eq!(y_train.len(), 7);
        assert_eq!(y_test.len(), 3);

        // Rows stay aligned with their labels
        for (row, &label) in x_train.rows().into_iter().zip(y_train.iter()) {
            assert_eq!(row[0], label * 2.0);
        }
    }

    #[test]
    fn test_train_test_split_deterministic() {
        let x = Array2::from_shape_fn((20, 1), |(r, _)| r as f64);
        let y: Array1<f64> = (0..20).map(|i| i as f64).collect();

        let (_, _, _, a) = train_test_split(&x, &y, 0.25, 7).unwrap();
        let (_, _, _, b) = train_test_split(&x, &y, 0.25, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_train_test_split_rejects_bad_fraction() {
        let x = Array2::zeros((4, 1));
        let y = Array1::zeros(4);
        assert!(train_test_split(&x, &y, 0.0, 1).is_err());
        assert!(train_test_split(&x, &y, 1.0, 1).is_err());
    }

    #[test]
    fn test_load_csv_and_matrix() {
        let dir = std::env::temp_dir().join("stackreg_data_csv");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("toy.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "a,b,target").unwrap();
        writeln!(file, "1.0,2.0,3.0").unwrap();
        writeln!(file, "4.0,5.0,9.0").unwrap();
        drop(file);

        let df = load_csv(&path).unwrap();
        let (x, y) = dataframe_to_matrix(&df, "target").unwrap();
        assert_eq!(x.nrows(), 2);
        assert_eq!(x.ncols(), 2);
        assert_eq!(x[[1, 0]], 4.0);
        assert_eq!(y[1], 9.0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_target_column() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        assert!(dataframe_to_matrix(&df, "target").is_err());
    }
}
