//! Standardization (z-score scaling).
//!
//! `z = (x - mean) / scale`, with mean and population standard deviation
//! learned at fit time. A constant column gets a scale of 1.0 so it maps to
//! zeros instead of dividing by zero.

use crate::error::{Result, TransformationError};
use crate::preprocessing::traits::Transformer;
use crate::utils::{numeric_chunked, numeric_values, require_columns};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mean and scale learned for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Option<Vec<ScalingParams>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> Option<&[ScalingParams]> {
        self.params.as_deref()
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let mut params = Vec::with_capacity(df.width());

        for col_name in df.get_column_names() {
            let observed = numeric_chunked(df, col_name)?;
            let col_mean = observed
                .mean()
                .ok_or_else(|| TransformationError::NoValidValues(col_name.to_string()))?;
            // population std (ddof = 0)
            let std = observed.std(0).unwrap_or(0.0);
            // near-zero spread counts as constant
            let scale = if std < 10.0 * f64::EPSILON * col_mean.abs().max(1.0) {
                1.0
            } else {
                std
            };

            debug!(
                "Scaler learned mean={:.4} scale={:.4} for '{}'",
                col_mean, scale, col_name
            );
            params.push(ScalingParams {
                column: col_name.to_string(),
                mean: col_mean,
                scale,
            });
        }

        self.params = Some(params);
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| TransformationError::NotFitted("StandardScaler".to_string()))?;

        let names: Vec<String> = params.iter().map(|p| p.column.clone()).collect();
        require_columns(df, &names, "input")?;

        let mut columns = Vec::with_capacity(params.len());
        for p in params {
            let scaled: Vec<Option<f64>> = numeric_values(df, &p.column)?
                .into_iter()
                .map(|v| v.map(|x| (x - p.mean) / p.scale))
                .collect();
            columns.push(Column::from(Series::new(p.column.as_str().into(), scaled)));
        }

        Ok(DataFrame::new(columns)?)
    }

    fn feature_names_out(&self) -> Result<Vec<String>> {
        self.params
            .as_ref()
            .map(|params| params.iter().map(|p| p.column.clone()).collect())
            .ok_or_else(|| TransformationError::NotFitted("StandardScaler".to_string()))
    }

    fn is_fitted(&self) -> bool {
        self.params.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(df: &DataFrame, col: &str) -> Vec<f64> {
        df.column(col)
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_standardize_basic() {
        let df = df!["score" => [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]].unwrap();

        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&df).unwrap();

        let params = &scaler.params().unwrap()[0];
        assert!((params.mean - 5.0).abs() < 1e-12);
        assert!((params.scale - 2.0).abs() < 1e-12);
        assert!((values(&out, "score")[0] + 1.5).abs() < 1e-12);
        assert!((values(&out, "score")[7] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_has_zero_mean() {
        let df = df!["score" => [72i64, 90, 47, 76, 71]].unwrap();

        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&df).unwrap();

        let scaled = values(&out, "score");
        let total: f64 = scaled.iter().sum();
        assert!(total.abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let df = df!["score" => [3.0, 3.0, 3.0]].unwrap();

        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&df).unwrap();

        assert_eq!(scaler.params().unwrap()[0].scale, 1.0);
        assert_eq!(values(&out, "score"), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_transform_uses_fitted_params() {
        let train = df!["score" => [0.0, 10.0]].unwrap();
        let test = df!["score" => [20.0]].unwrap();

        let mut scaler = StandardScaler::new();
        scaler.fit(&train).unwrap();
        let before = scaler.clone();
        let out = scaler.transform(&test).unwrap();

        // mean 5, scale 5
        assert!((values(&out, "score")[0] - 3.0).abs() < 1e-12);
        assert_eq!(scaler, before);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = df!["score" => [1.0]].unwrap();
        assert_eq!(
            StandardScaler::new().transform(&df).unwrap_err().error_code(),
            "NOT_FITTED"
        );
    }
}
