//! Configuration types for the feature transformation step.
//!
//! This module provides configuration options using the builder pattern.
//! The defaults describe the student performance dataset: two numeric score
//! columns, five categorical columns and `math_score` as the target.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default location of the persisted preprocessing pipeline.
pub const DEFAULT_PREPROCESSOR_PATH: &str = "artifacts/preprocessor.json";

/// Default target column.
pub const DEFAULT_TARGET_COLUMN: &str = "math_score";

/// Default numeric feature columns.
pub const DEFAULT_NUMERICAL_COLUMNS: [&str; 2] = ["writing_score", "reading_score"];

/// Default categorical feature columns.
pub const DEFAULT_CATEGORICAL_COLUMNS: [&str; 5] = [
    "gender",
    "race_ethnicity",
    "parental_level_of_education",
    "lunch",
    "test_preparation_course",
];

/// Strategy for imputing missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumericImputation {
    /// Use the median of non-null training values
    #[default]
    Median,
    /// Use the mean of non-null training values
    Mean,
}

/// Strategy for imputing missing categorical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CategoricalImputation {
    /// Use the most frequent training value
    #[default]
    MostFrequent,
    /// Use the constant value "missing"
    Constant,
}

/// What the one-hot encoder does with a category never seen during fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HandleUnknown {
    /// Fail the transformation
    #[default]
    Error,
    /// Emit an all-zero indicator block for that column
    Ignore,
}

/// Configuration for the transformation step.
///
/// Use [`TransformationConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use feature_transform::config::{HandleUnknown, TransformationConfig};
///
/// let config = TransformationConfig::builder()
///     .preprocessor_path("artifacts/preprocessor.json")
///     .handle_unknown(HandleUnknown::Ignore)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationConfig {
    /// Where the fitted pipeline is written. Overwritten on every run.
    pub preprocessor_obj_file_path: PathBuf,

    /// Column predicted by the downstream model.
    pub target_column: String,

    /// Columns routed through impute + standardize.
    pub numerical_columns: Vec<String>,

    /// Columns routed through impute + one-hot encode.
    pub categorical_columns: Vec<String>,

    pub numeric_imputation: NumericImputation,

    pub categorical_imputation: CategoricalImputation,

    pub handle_unknown: HandleUnknown,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self {
            preprocessor_obj_file_path: PathBuf::from(DEFAULT_PREPROCESSOR_PATH),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            numerical_columns: DEFAULT_NUMERICAL_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            categorical_columns: DEFAULT_CATEGORICAL_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            numeric_imputation: NumericImputation::default(),
            categorical_imputation: CategoricalImputation::default(),
            handle_unknown: HandleUnknown::default(),
        }
    }
}

impl TransformationConfig {
    /// Create a new configuration builder.
    pub fn builder() -> TransformationConfigBuilder {
        TransformationConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: TransformationConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTarget);
        }

        if self.preprocessor_obj_file_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyArtifactPath);
        }

        if self.numerical_columns.is_empty() && self.categorical_columns.is_empty() {
            return Err(ConfigValidationError::NoFeatureColumns);
        }

        let mut seen = HashSet::new();
        for col in &self.numerical_columns {
            if !seen.insert(col.as_str()) {
                return Err(ConfigValidationError::DuplicateColumn(col.clone()));
            }
        }

        let numeric: HashSet<&str> = seen.clone();
        let mut seen_categorical = HashSet::new();
        for col in &self.categorical_columns {
            if numeric.contains(col.as_str()) {
                return Err(ConfigValidationError::OverlappingColumn(col.clone()));
            }
            if !seen_categorical.insert(col.as_str()) {
                return Err(ConfigValidationError::DuplicateColumn(col.clone()));
            }
        }

        if numeric.contains(self.target_column.as_str())
            || seen_categorical.contains(self.target_column.as_str())
        {
            return Err(ConfigValidationError::TargetInFeatures(
                self.target_column.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Target column name must not be empty")]
    EmptyTarget,

    #[error("Preprocessor artifact path must not be empty")]
    EmptyArtifactPath,

    #[error("At least one numerical or categorical column is required")]
    NoFeatureColumns,

    #[error("Column '{0}' is listed more than once")]
    DuplicateColumn(String),

    #[error("Column '{0}' is listed as both numerical and categorical")]
    OverlappingColumn(String),

    #[error("Target column '{0}' must not be used as a feature")]
    TargetInFeatures(String),
}

/// Builder for [`TransformationConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct TransformationConfigBuilder {
    preprocessor_obj_file_path: Option<PathBuf>,
    target_column: Option<String>,
    numerical_columns: Option<Vec<String>>,
    categorical_columns: Option<Vec<String>>,
    numeric_imputation: Option<NumericImputation>,
    categorical_imputation: Option<CategoricalImputation>,
    handle_unknown: Option<HandleUnknown>,
}

impl TransformationConfigBuilder {
    /// Set where the fitted pipeline is persisted.
    pub fn preprocessor_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preprocessor_obj_file_path = Some(path.into());
        self
    }

    /// Set the target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the numeric feature columns.
    pub fn numerical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numerical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the categorical feature columns.
    pub fn categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn numeric_imputation(mut self, strategy: NumericImputation) -> Self {
        self.numeric_imputation = Some(strategy);
        self
    }

    pub fn categorical_imputation(mut self, strategy: CategoricalImputation) -> Self {
        self.categorical_imputation = Some(strategy);
        self
    }

    /// Set the policy for categories never seen during fit.
    pub fn handle_unknown(mut self, policy: HandleUnknown) -> Self {
        self.handle_unknown = Some(policy);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `TransformationConfig` or an error if validation fails.
    pub fn build(self) -> Result<TransformationConfig, ConfigValidationError> {
        let defaults = TransformationConfig::default();
        let config = TransformationConfig {
            preprocessor_obj_file_path: self
                .preprocessor_obj_file_path
                .unwrap_or(defaults.preprocessor_obj_file_path),
            target_column: self.target_column.unwrap_or(defaults.target_column),
            numerical_columns: self.numerical_columns.unwrap_or(defaults.numerical_columns),
            categorical_columns: self
                .categorical_columns
                .unwrap_or(defaults.categorical_columns),
            numeric_imputation: self.numeric_imputation.unwrap_or_default(),
            categorical_imputation: self.categorical_imputation.unwrap_or_default(),
            handle_unknown: self.handle_unknown.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
