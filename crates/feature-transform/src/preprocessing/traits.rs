//! The capability every preprocessing step implements.

use crate::error::Result;
use polars::prelude::*;

/// A step that learns parameters from data and applies them.
///
/// `fit` is the only method allowed to change learned state. `transform`
/// takes `&self`, so applying a fitted step to test data can never alter the
/// parameters learned from training data.
pub trait Transformer {
    /// Learn parameters from every column of `df`.
    fn fit(&mut self, df: &DataFrame) -> Result<()>;

    /// Apply the learned parameters, returning a new frame.
    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    /// Fit on `df` and transform it in one pass.
    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Names of the columns `transform` produces.
    fn feature_names_out(&self) -> Result<Vec<String>>;

    fn is_fitted(&self) -> bool;
}
