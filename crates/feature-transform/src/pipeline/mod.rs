//! Pipeline module.
//!
//! Composition of preprocessing steps: sequential pipelines, the column
//! routing composite, and progress reporting for transformation runs.

mod column_transformer;
mod sequence;
pub mod progress;

pub use column_transformer::{Branch, ColumnTransformer, frame_to_array};
pub use progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate, TransformStage};
pub use sequence::{NamedStep, Pipeline};
