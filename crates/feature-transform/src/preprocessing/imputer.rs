//! Statistical imputation of missing values.
//!
//! Provides median and mean imputation for numeric columns and most-frequent
//! and constant imputation for categorical columns. Statistics are learned per
//! column at fit time and reused unchanged by every later transform.

use crate::error::{Result, TransformationError};
use crate::preprocessing::traits::Transformer;
use crate::utils::{numeric_chunked, numeric_values, require_columns, string_mode, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fill value used by [`ImputeStrategy::Constant`] unless overridden.
pub const DEFAULT_FILL_VALUE: &str = "missing";

/// How an imputer derives its fill value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Median,
    Mean,
    MostFrequent,
    Constant(String),
}

impl ImputeStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Median => "median",
            Self::Mean => "mean",
            Self::MostFrequent => "most_frequent",
            Self::Constant(_) => "constant",
        }
    }
}

/// A learned fill value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillValue {
    Number(f64),
    Text(String),
}

/// Fill value learned for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistic {
    pub column: String,
    pub value: FillValue,
}

/// Replaces missing values with a per-column statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
    statistics: Option<Vec<ColumnStatistic>>,
}

impl SimpleImputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            statistics: None,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    /// Learned fill values, in column order. `None` before fit.
    pub fn statistics(&self) -> Option<&[ColumnStatistic]> {
        self.statistics.as_deref()
    }

    fn learn(&self, df: &DataFrame, col_name: &str) -> Result<FillValue> {
        match &self.strategy {
            ImputeStrategy::Median | ImputeStrategy::Mean => {
                let observed = numeric_chunked(df, col_name)?;
                let stat = if self.strategy == ImputeStrategy::Median {
                    observed.median()
                } else {
                    observed.mean()
                };
                stat.map(FillValue::Number)
                    .ok_or_else(|| TransformationError::NoValidValues(col_name.to_string()))
            }
            ImputeStrategy::MostFrequent => {
                let values = string_values(df, col_name)?;
                string_mode(values.iter().flatten().map(String::as_str))
                    .map(FillValue::Text)
                    .ok_or_else(|| TransformationError::NoValidValues(col_name.to_string()))
            }
            ImputeStrategy::Constant(value) => Ok(FillValue::Text(value.clone())),
        }
    }

    fn fill(df: &DataFrame, stat: &ColumnStatistic) -> Result<Column> {
        let name: PlSmallStr = stat.column.as_str().into();
        let series = match &stat.value {
            FillValue::Number(fill_value) => {
                let filled: Vec<f64> = numeric_values(df, &stat.column)?
                    .into_iter()
                    .map(|v| v.unwrap_or(*fill_value))
                    .collect();
                Series::new(name, filled)
            }
            FillValue::Text(fill_value) => {
                let filled: Vec<String> = string_values(df, &stat.column)?
                    .into_iter()
                    .map(|v| v.unwrap_or_else(|| fill_value.clone()))
                    .collect();
                Series::new(name, filled)
            }
        };
        Ok(Column::from(series))
    }
}

impl Transformer for SimpleImputer {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let mut statistics = Vec::with_capacity(df.width());

        for col_name in df.get_column_names() {
            let value = self.learn(df, col_name)?;
            debug!(
                "Imputer ({}) learned {:?} for '{}'",
                self.strategy.name(),
                value,
                col_name
            );
            statistics.push(ColumnStatistic {
                column: col_name.to_string(),
                value,
            });
        }

        self.statistics = Some(statistics);
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let statistics = self
            .statistics
            .as_ref()
            .ok_or_else(|| TransformationError::NotFitted("SimpleImputer".to_string()))?;

        let names: Vec<String> = statistics.iter().map(|s| s.column.clone()).collect();
        require_columns(df, &names, "input")?;

        let columns = statistics
            .iter()
            .map(|stat| Self::fill(df, stat))
            .collect::<Result<Vec<_>>>()?;

        Ok(DataFrame::new(columns)?)
    }

    fn feature_names_out(&self) -> Result<Vec<String>> {
        self.statistics
            .as_ref()
            .map(|stats| stats.iter().map(|s| s.column.clone()).collect())
            .ok_or_else(|| TransformationError::NotFitted("SimpleImputer".to_string()))
    }

    fn is_fitted(&self) -> bool {
        self.statistics.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_at(df: &DataFrame, col: &str, idx: usize) -> f64 {
        df.column(col)
            .unwrap()
            .get(idx)
            .unwrap()
            .try_extract::<f64>()
            .unwrap()
    }

    // ========================================================================
    // numeric strategies
    // ========================================================================

    #[test]
    fn test_median_imputation_basic() {
        let df = df![
            "values" => [Some(1.0), None, Some(3.0), None, Some(5.0)],
        ]
        .unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::Median);
        let out = imputer.fit_transform(&df).unwrap();

        assert_eq!(out.column("values").unwrap().null_count(), 0);
        // Median of [1, 3, 5] = 3
        assert_eq!(f64_at(&out, "values", 1), 3.0);
        assert_eq!(f64_at(&out, "values", 3), 3.0);
        assert_eq!(f64_at(&out, "values", 0), 1.0);
    }

    #[test]
    fn test_median_learned_from_fit_data_only() {
        let train = df!["values" => [Some(10.0), Some(20.0), None]].unwrap();
        let test = df!["values" => [Option::<f64>::None, Some(1000.0)]].unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::Median);
        imputer.fit(&train).unwrap();
        let out = imputer.transform(&test).unwrap();

        assert_eq!(f64_at(&out, "values", 0), 15.0);
        assert_eq!(
            imputer.statistics().unwrap()[0].value,
            FillValue::Number(15.0)
        );
    }

    #[test]
    fn test_median_even_count_ignores_nan() {
        let df = df![
            "values" => [Some(4.0), Some(f64::NAN), Some(1.0), None, Some(3.0), Some(2.0)],
        ]
        .unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::Median);
        let out = imputer.fit_transform(&df).unwrap();

        // observed [1, 2, 3, 4]
        assert_eq!(
            imputer.statistics().unwrap()[0].value,
            FillValue::Number(2.5)
        );
        assert_eq!(f64_at(&out, "values", 1), 2.5);
        assert_eq!(f64_at(&out, "values", 3), 2.5);
    }

    #[test]
    fn test_mean_imputation_integer_column() {
        let df = df!["values" => [Some(10i64), None, Some(20)]].unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::Mean);
        let out = imputer.fit_transform(&df).unwrap();

        assert!(matches!(
            out.column("values").unwrap().dtype(),
            DataType::Float64
        ));
        assert_eq!(f64_at(&out, "values", 1), 15.0);
    }

    #[test]
    fn test_numeric_all_nulls_fails() {
        let df = df!["values" => [Option::<f64>::None, None]].unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::Median);
        let err = imputer.fit(&df).unwrap_err();
        assert_eq!(err.error_code(), "NO_VALID_VALUES");
        assert!(!imputer.is_fitted());
    }

    // ========================================================================
    // categorical strategies
    // ========================================================================

    #[test]
    fn test_most_frequent_imputation() {
        let df = df![
            "category" => [Some("A"), Some("B"), Some("A"), None, Some("A")],
        ]
        .unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::MostFrequent);
        let out = imputer.fit_transform(&df).unwrap();

        let category = out.column("category").unwrap();
        assert_eq!(category.null_count(), 0);
        assert_eq!(category.as_materialized_series().str().unwrap().get(3), Some("A"));
    }

    #[test]
    fn test_most_frequent_all_nulls_fails() {
        let df = df!["lunch" => [Option::<&str>::None, None]].unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::MostFrequent);
        let err = imputer.fit(&df).unwrap_err();
        assert!(matches!(err, TransformationError::NoValidValues(ref c) if c == "lunch"));
    }

    #[test]
    fn test_constant_imputation() {
        let df = df!["text" => [Some("Hello"), None]].unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::Constant(
            DEFAULT_FILL_VALUE.to_string(),
        ));
        let out = imputer.fit_transform(&df).unwrap();

        assert_eq!(out.column("text").unwrap().as_materialized_series().str().unwrap().get(1), Some("missing"));
    }

    // ========================================================================
    // state handling
    // ========================================================================

    #[test]
    fn test_transform_before_fit_fails() {
        let df = df!["values" => [1.0]].unwrap();
        let imputer = SimpleImputer::new(ImputeStrategy::Median);

        let err = imputer.transform(&df).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FITTED");
    }

    #[test]
    fn test_transform_missing_column_fails() {
        let train = df!["a" => [1.0], "b" => [2.0]].unwrap();
        let test = df!["a" => [1.0]].unwrap();

        let mut imputer = SimpleImputer::new(ImputeStrategy::Median);
        imputer.fit(&train).unwrap();
        let err = imputer.transform(&test).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
