//! Error types for the feature transformation step.
//!
//! Every failure inside the build/fit/transform/persist sequence is funnelled
//! into [`TransformationError`]. Errors raised deeper in the stack are wrapped
//! with a context label and the `file:line` of the wrapping call site, so a
//! failed training run can be traced back to the step that aborted it.
//!
//! Errors are serializable, allowing them to be emitted as JSON by callers
//! that report failures to another process.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::panic::Location;
use thiserror::Error;

/// The single domain error of the transformation step.
#[derive(Error, Debug)]
pub enum TransformationError {
    /// A required column is missing from one of the datasets.
    #[error("Column '{column}' not found in {dataset} dataset")]
    ColumnNotFound { column: String, dataset: String },

    /// The dataset has no rows.
    #[error("The {0} dataset is empty")]
    EmptyDataset(String),

    /// No non-missing values to learn a statistic from.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// A category seen at transform time was never observed during fit.
    #[error("Found unknown category '{category}' in column '{column}' during transform")]
    UnknownCategory { column: String, category: String },

    /// The target column contains missing values.
    #[error("Target column '{column}' contains {count} missing values")]
    MissingTarget { column: String, count: usize },

    /// A transformer was used before being fitted.
    #[error("Transformer '{0}' is not fitted yet")]
    NotFitted(String),

    /// Type conversion failed.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// Branch outputs could not be aligned.
    #[error("Row count mismatch: expected {expected} rows, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ndarray shape error.
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Underlying failure wrapped with a context marker.
    #[error("{context} (at {location}): {source}")]
    WithContext {
        context: String,
        location: &'static Location<'static>,
        #[source]
        source: Box<TransformationError>,
    },
}

impl TransformationError {
    /// Wrap the error with a context label and the caller's location.
    #[track_caller]
    pub fn with_context(self, context: impl Into<String>) -> Self {
        self.with_location(context, Location::caller())
    }

    fn with_location(
        self,
        context: impl Into<String>,
        location: &'static Location<'static>,
    ) -> Self {
        TransformationError::WithContext {
            context: context.into(),
            location,
            source: Box::new(self),
        }
    }

    /// Get a stable error code. Wrapping preserves the code of the root cause.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            Self::EmptyDataset(_) => "EMPTY_DATASET",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::MissingTarget { .. } => "MISSING_TARGET",
            Self::NotFitted(_) => "NOT_FITTED",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Shape(_) => "SHAPE_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The innermost error, skipping any context wrappers.
    pub fn root_cause(&self) -> &TransformationError {
        match self {
            Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Location of the outermost context marker, if any.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            Self::WithContext { location, .. } => Some(location),
            _ => None,
        }
    }
}

impl Serialize for TransformationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TransformationError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for transformation operations.
pub type Result<T> = std::result::Result<T, TransformationError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add a context label and the caller's location to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[track_caller]
    fn context(self, context: impl Into<String>) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| e.with_location(context, location))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    #[track_caller]
    fn context(self, context: impl Into<String>) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| TransformationError::Polars(e).with_location(context, location))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    #[track_caller]
    fn context(self, context: impl Into<String>) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| TransformationError::Io(e).with_location(context, location))
    }
}
