//! Preprocessing primitives.
//!
//! This module provides the building blocks the preprocessing pipeline is
//! composed of:
//! - Statistical imputation (median, mean, most frequent, constant)
//! - Standardization
//! - One-hot encoding
//!
//! All of them implement [`Transformer`]. [`Step`] wraps them in a closed,
//! serializable enum so a fitted pipeline can be persisted and reloaded.

mod imputer;
mod one_hot;
mod scaler;
mod traits;

pub use imputer::{ColumnStatistic, DEFAULT_FILL_VALUE, FillValue, ImputeStrategy, SimpleImputer};
pub use one_hot::{ColumnCategories, OneHotEncoder};
pub use scaler::{ScalingParams, StandardScaler};
pub use traits::Transformer;

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Any preprocessing step that can appear inside a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Imputer(SimpleImputer),
    Scaler(StandardScaler),
    Encoder(OneHotEncoder),
}

impl Transformer for Step {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        match self {
            Step::Imputer(t) => t.fit(df),
            Step::Scaler(t) => t.fit(df),
            Step::Encoder(t) => t.fit(df),
        }
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            Step::Imputer(t) => t.transform(df),
            Step::Scaler(t) => t.transform(df),
            Step::Encoder(t) => t.transform(df),
        }
    }

    fn feature_names_out(&self) -> Result<Vec<String>> {
        match self {
            Step::Imputer(t) => t.feature_names_out(),
            Step::Scaler(t) => t.feature_names_out(),
            Step::Encoder(t) => t.feature_names_out(),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Step::Imputer(t) => t.is_fitted(),
            Step::Scaler(t) => t.is_fitted(),
            Step::Encoder(t) => t.is_fitted(),
        }
    }
}

impl From<SimpleImputer> for Step {
    fn from(t: SimpleImputer) -> Self {
        Step::Imputer(t)
    }
}

impl From<StandardScaler> for Step {
    fn from(t: StandardScaler) -> Self {
        Step::Scaler(t)
    }
}

impl From<OneHotEncoder> for Step {
    fn from(t: OneHotEncoder) -> Self {
        Step::Encoder(t)
    }
}
