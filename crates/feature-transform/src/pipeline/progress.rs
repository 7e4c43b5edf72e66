//! Progress reporting for the transformation step.
//!
//! Reporters are injected into [`DataTransformation`](crate::DataTransformation)
//! and receive one update per major step. Updates are purely observational;
//! nothing a reporter does can change the returned matrices.
//!
//! # Example
//!
//! ```rust,ignore
//! use feature_transform::{DataTransformation, TransformationConfig};
//!
//! let transformation = DataTransformation::new(TransformationConfig::default())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     });
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the transformation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStage {
    /// Reading train and test data
    ReadingData,
    /// Building the unfitted preprocessing pipeline
    BuildingPipeline,
    /// Fitting on train and transforming train and test
    Transforming,
    /// Persisting the fitted pipeline
    SavingArtifact,
    /// Step completed successfully
    Complete,
    /// Step failed with an error
    Failed,
}

impl TransformStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ReadingData => "Reading Data",
            Self::BuildingPipeline => "Building Pipeline",
            Self::Transforming => "Transforming",
            Self::SavingArtifact => "Saving Artifact",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Overall progress once this stage has finished.
    pub fn progress(&self) -> f32 {
        match self {
            Self::ReadingData => 0.2,
            Self::BuildingPipeline => 0.3,
            Self::Transforming => 0.8,
            Self::SavingArtifact => 0.95,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: TransformStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: TransformStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.progress(),
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(TransformStage::Complete, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(TransformStage::Failed, message)
    }
}

/// Receives progress updates during a transformation run.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
