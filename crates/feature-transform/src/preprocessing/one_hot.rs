//! One-hot encoding for categorical columns.
//!
//! Each distinct category observed during fit becomes an indicator column
//! named `<column>_<category>`. Categories are kept in sorted order so the
//! output layout only depends on the set of training categories. Columns with
//! a numeric dtype sort by value (`2` before `10`), all others by text.

use crate::config::HandleUnknown;
use crate::error::{Result, TransformationError};
use crate::preprocessing::traits::Transformer;
use crate::utils::{is_numeric_dtype, require_columns, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Categories learned for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCategories {
    pub column: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
    categories: Option<Vec<ColumnCategories>>,
}

impl OneHotEncoder {
    pub fn new(handle_unknown: HandleUnknown) -> Self {
        Self {
            handle_unknown,
            categories: None,
        }
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    /// Learned categories per column. `None` before fit.
    pub fn categories(&self) -> Option<&[ColumnCategories]> {
        self.categories.as_deref()
    }

    fn encode_column(&self, df: &DataFrame, learned: &ColumnCategories) -> Result<Vec<Column>> {
        let values = string_values(df, &learned.column)?;
        let index: HashMap<&str, usize> = learned
            .categories
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.as_str(), idx))
            .collect();
        let mut indicators = vec![vec![0.0f64; values.len()]; learned.categories.len()];
        let mut unknown_count = 0usize;

        for (row, value) in values.iter().enumerate() {
            let position = value.as_deref().and_then(|v| index.get(v).copied());

            match position {
                Some(idx) => indicators[idx][row] = 1.0,
                None => match self.handle_unknown {
                    HandleUnknown::Error => {
                        return Err(TransformationError::UnknownCategory {
                            column: learned.column.clone(),
                            category: value.clone().unwrap_or_else(|| "<null>".to_string()),
                        });
                    }
                    HandleUnknown::Ignore => unknown_count += 1,
                },
            }
        }

        if unknown_count > 0 {
            warn!(
                "{} unknown categories in '{}' encoded as all-zero rows",
                unknown_count, learned.column
            );
        }

        Ok(learned
            .categories
            .iter()
            .zip(indicators)
            .map(|(category, indicator)| {
                let name = format!("{}_{}", learned.column, category);
                Column::from(Series::new(name.into(), indicator))
            })
            .collect())
    }
}

/// Order numeric category labels by value.
fn numeric_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new(HandleUnknown::default())
    }
}

impl Transformer for OneHotEncoder {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let mut learned = Vec::with_capacity(df.width());

        for col_name in df.get_column_names() {
            let distinct: BTreeSet<String> =
                string_values(df, col_name)?.into_iter().flatten().collect();
            if distinct.is_empty() {
                return Err(TransformationError::NoValidValues(col_name.to_string()));
            }
            let mut categories: Vec<String> = distinct.into_iter().collect();
            if is_numeric_dtype(df.column(col_name)?.dtype()) {
                categories.sort_by(|a, b| numeric_order(a, b));
            }

            debug!("Encoder learned {} categories for '{}'", categories.len(), col_name);
            learned.push(ColumnCategories {
                column: col_name.to_string(),
                categories,
            });
        }

        self.categories = Some(learned);
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let learned = self
            .categories
            .as_ref()
            .ok_or_else(|| TransformationError::NotFitted("OneHotEncoder".to_string()))?;

        let names: Vec<String> = learned.iter().map(|c| c.column.clone()).collect();
        require_columns(df, &names, "input")?;

        let mut columns = Vec::new();
        for col in learned {
            columns.extend(self.encode_column(df, col)?);
        }

        Ok(DataFrame::new(columns)?)
    }

    fn feature_names_out(&self) -> Result<Vec<String>> {
        let learned = self
            .categories
            .as_ref()
            .ok_or_else(|| TransformationError::NotFitted("OneHotEncoder".to_string()))?;

        Ok(learned
            .iter()
            .flat_map(|c| {
                c.categories
                    .iter()
                    .map(move |category| format!("{}_{}", c.column, category))
            })
            .collect())
    }

    fn is_fitted(&self) -> bool {
        self.categories.is_some()
    }
}
