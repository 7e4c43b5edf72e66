//! Sequential pipeline of named steps.

use crate::error::{Result, ResultExt};
use crate::preprocessing::{Step, Transformer};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A named step inside a [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedStep {
    pub name: String,
    pub step: Step,
}

/// Steps applied one after another, each fed the previous step's output.
///
/// # Example
///
/// ```rust,ignore
/// use feature_transform::pipeline::Pipeline;
/// use feature_transform::preprocessing::{ImputeStrategy, SimpleImputer, StandardScaler};
///
/// let num_pipeline = Pipeline::new()
///     .step("imputer", SimpleImputer::new(ImputeStrategy::Median))
///     .step("scaler", StandardScaler::new());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    steps: Vec<NamedStep>,
    input_columns: Option<Vec<String>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn step(mut self, name: impl Into<String>, step: impl Into<Step>) -> Self {
        self.steps.push(NamedStep {
            name: name.into(),
            step: step.into(),
        });
        self
    }

    pub fn steps(&self) -> &[NamedStep] {
        &self.steps
    }

    /// Look up a step by name.
    pub fn get(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name).map(|s| &s.step)
    }
}

impl Transformer for Pipeline {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.fit_transform(df).map(|_| ())
    }

    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let mut current = df.clone();
        for named in &mut self.steps {
            current = named
                .step
                .fit_transform(&current)
                .context(format!("Fitting step '{}'", named.name))?;
        }
        self.input_columns = Some(
            df.get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        Ok(current)
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut current = df.clone();
        for named in &self.steps {
            current = named
                .step
                .transform(&current)
                .context(format!("Applying step '{}'", named.name))?;
        }
        Ok(current)
    }

    fn feature_names_out(&self) -> Result<Vec<String>> {
        match self.steps.last() {
            Some(last) => last.step.feature_names_out(),
            None => Ok(self.input_columns.clone().unwrap_or_default()),
        }
    }

    fn is_fitted(&self) -> bool {
        self.input_columns.is_some() && self.steps.iter().all(|s| s.step.is_fitted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{ImputeStrategy, OneHotEncoder, SimpleImputer, StandardScaler};

    #[test]
    fn test_impute_then_scale() {
        let df = df!["score" => [Some(1.0), None, Some(3.0)]].unwrap();

        let mut pipeline = Pipeline::new()
            .step("imputer", SimpleImputer::new(ImputeStrategy::Median))
            .step("scaler", StandardScaler::new());
        let out = pipeline.fit_transform(&df).unwrap();

        // imputed to [1, 2, 3], mean 2
        let scaled: Vec<f64> = out
            .column("score")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(scaled[1], 0.0);
        assert!(scaled[0] < 0.0 && scaled[2] > 0.0);
        assert!(pipeline.is_fitted());
    }

    #[test]
    fn test_impute_then_encode() {
        let df = df!["lunch" => [Some("standard"), None, Some("standard"), Some("free")]].unwrap();

        let mut pipeline = Pipeline::new()
            .step("imputer", SimpleImputer::new(ImputeStrategy::MostFrequent))
            .step("encoder", OneHotEncoder::default());
        let out = pipeline.fit_transform(&df).unwrap();

        assert_eq!(
            pipeline.feature_names_out().unwrap(),
            vec!["lunch_free", "lunch_standard"]
        );
        // the missing value became "standard"
        let standard = out.column("lunch_standard").unwrap();
        assert_eq!(standard.get(1).unwrap().try_extract::<f64>().unwrap(), 1.0);
    }

    #[test]
    fn test_step_failure_carries_step_name() {
        let df = df!["score" => [Option::<f64>::None]].unwrap();

        let mut pipeline =
            Pipeline::new().step("imputer", SimpleImputer::new(ImputeStrategy::Median));
        let err = pipeline.fit(&df).unwrap_err();

        assert!(err.to_string().contains("Fitting step 'imputer'"));
        assert_eq!(err.error_code(), "NO_VALID_VALUES");
        assert!(!pipeline.is_fitted());
    }

    #[test]
    fn test_get_step_by_name() {
        let pipeline = Pipeline::new().step("scaler", StandardScaler::new());
        assert!(matches!(pipeline.get("scaler"), Some(Step::Scaler(_))));
        assert!(pipeline.get("imputer").is_none());
    }
}
