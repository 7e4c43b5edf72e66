//! Feature Transformation Library
//!
//! The feature engineering step of the student performance regression project,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! Given a train and a test dataset, this library:
//!
//! - **Builds** a column-wise preprocessing pipeline: numeric columns are
//!   imputed (median) and standardized, categorical columns are imputed (most
//!   frequent) and one-hot encoded
//! - **Fits** the pipeline on the training features only
//! - **Transforms** both partitions with the learned parameters and appends the
//!   untouched target as the last column
//! - **Persists** the fitted pipeline so inference can reuse it
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use feature_transform::{DataTransformation, TransformationConfig};
//!
//! let config = TransformationConfig::builder()
//!     .preprocessor_path("artifacts/preprocessor.json")
//!     .target_column("math_score")
//!     .build()?;
//!
//! let output = DataTransformation::new(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .initiate_data_transformation("artifacts/train.csv", "artifacts/test.csv")?;
//!
//! println!("Train matrix: {:?}", output.train.dim());
//! println!("Preprocessor: {}", output.preprocessor_path.display());
//! ```
//!
//! # Inference
//!
//! ```rust,ignore
//! use feature_transform::FittedPreprocessor;
//!
//! let preprocessor = FittedPreprocessor::load("artifacts/preprocessor.json")?;
//! let features = preprocessor.transform(&new_rows)?;
//! ```
//!
//! # Errors
//!
//! Every failure surfaces as a [`TransformationError`]. Errors raised inside a
//! step are wrapped with a context label and the source location of the
//! wrapping call; [`TransformationError::error_code`] returns the code of the
//! root cause.

pub mod artifact;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod preprocessing;
pub mod transformation;
pub mod utils;

// Re-exports for convenient access
pub use artifact::{FittedPreprocessor, load_object, save_object};
pub use config::{
    CategoricalImputation, ConfigValidationError, HandleUnknown, NumericImputation,
    TransformationConfig, TransformationConfigBuilder,
};
pub use error::{Result as TransformationResult, ResultExt, TransformationError};
pub use logging::{init_console_logging, init_file_logging};
pub use pipeline::{
    ClosureProgressReporter, ColumnTransformer, Pipeline, ProgressReporter, ProgressUpdate,
    TransformStage,
};
pub use preprocessing::{
    ImputeStrategy, OneHotEncoder, SimpleImputer, StandardScaler, Step, Transformer,
};
pub use transformation::{DataTransformation, TransformationOutput, read_csv};
