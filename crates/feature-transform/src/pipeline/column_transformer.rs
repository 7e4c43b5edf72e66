//! Column routing composite.
//!
//! A [`ColumnTransformer`] hands each branch only the columns it owns, runs
//! the branch pipeline and concatenates the branch outputs column-wise in
//! branch order. Columns owned by no branch are dropped. Output columns are
//! prefixed with the branch name (`num_pipeline__writing_score`).

use crate::error::{Result, ResultExt, TransformationError};
use crate::pipeline::Pipeline;
use crate::preprocessing::Transformer;
use crate::utils::require_columns;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One routed branch: a pipeline applied to a fixed set of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub columns: Vec<String>,
    pub pipeline: Pipeline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    branches: Vec<Branch>,
    fitted: bool,
}

impl ColumnTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a branch. Branches with no columns are skipped.
    pub fn branch<I, S>(mut self, name: impl Into<String>, pipeline: Pipeline, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if !columns.is_empty() {
            self.branches.push(Branch {
                name: name.into(),
                columns,
                pipeline,
            });
        }
        self
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Look up a branch by name.
    pub fn get(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// Every column the transformer reads, in branch order.
    pub fn input_columns(&self) -> Vec<String> {
        self.branches
            .iter()
            .flat_map(|b| b.columns.iter().cloned())
            .collect()
    }

    /// Total number of output columns. Only known after fit.
    pub fn n_features_out(&self) -> Result<usize> {
        Ok(self.feature_names_out()?.len())
    }

    /// Apply the fitted transformer and return a dense row-major matrix.
    pub fn transform_to_array(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let out = self.transform(df)?;
        frame_to_array(&out)
    }

    /// Fit on `df` and return the transformed matrix.
    pub fn fit_transform_to_array(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        let out = self.fit_transform(df)?;
        frame_to_array(&out)
    }

    fn concat(&self, outputs: Vec<(&Branch, DataFrame)>, expected_rows: usize) -> Result<DataFrame> {
        let mut columns = Vec::new();
        for (branch, out) in outputs {
            if out.height() != expected_rows {
                return Err(TransformationError::ShapeMismatch {
                    expected: expected_rows,
                    actual: out.height(),
                });
            }
            for col in out.get_columns() {
                let mut series = col.as_materialized_series().clone();
                series.rename(format!("{}__{}", branch.name, col.name()).into());
                columns.push(Column::from(series));
            }
        }
        Ok(DataFrame::new(columns)?)
    }
}

impl Transformer for ColumnTransformer {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.fit_transform(df).map(|_| ())
    }

    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        require_columns(df, &self.input_columns(), "input")?;

        let mut outputs = Vec::with_capacity(self.branches.len());
        for branch in &mut self.branches {
            let subset = df.select(branch.columns.iter().map(|c| c.as_str()))?;
            let out = branch
                .pipeline
                .fit_transform(&subset)
                .context(format!("Fitting branch '{}'", branch.name))?;
            debug!(
                "Branch '{}' fitted: {} columns in, {} out",
                branch.name,
                branch.columns.len(),
                out.width()
            );
            outputs.push(out);
        }

        self.fitted = true;
        let paired = self.branches.iter().zip(outputs).collect();
        self.concat(paired, df.height())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(TransformationError::NotFitted("ColumnTransformer".to_string()));
        }
        require_columns(df, &self.input_columns(), "input")?;

        let mut outputs = Vec::with_capacity(self.branches.len());
        for branch in &self.branches {
            let subset = df.select(branch.columns.iter().map(|c| c.as_str()))?;
            let out = branch
                .pipeline
                .transform(&subset)
                .context(format!("Applying branch '{}'", branch.name))?;
            outputs.push((branch, out));
        }

        self.concat(outputs, df.height())
    }

    fn feature_names_out(&self) -> Result<Vec<String>> {
        if !self.fitted {
            return Err(TransformationError::NotFitted("ColumnTransformer".to_string()));
        }
        let mut names = Vec::new();
        for branch in &self.branches {
            for name in branch.pipeline.feature_names_out()? {
                names.push(format!("{}__{}", branch.name, name));
            }
        }
        Ok(names)
    }

    fn is_fitted(&self) -> bool {
        self.fitted && self.branches.iter().all(|b| b.pipeline.is_fitted())
    }
}

/// Convert a frame of numeric columns into a row-major `Array2<f64>`.
/// Missing values become NaN.
pub fn frame_to_array(df: &DataFrame) -> Result<Array2<f64>> {
    let mut array = Array2::<f64>::zeros((df.height(), df.width()));
    for (j, col) in df.get_columns().iter().enumerate() {
        let floats = col.as_materialized_series().cast(&DataType::Float64)?;
        for (i, value) in floats.f64()?.into_iter().enumerate() {
            array[[i, j]] = value.unwrap_or(f64::NAN);
        }
    }
    Ok(array)
}
