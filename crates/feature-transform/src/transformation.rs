//! Feature transformation step.
//!
//! Reads train and test data, builds the column preprocessing pipeline, fits
//! it on the training features only, applies it to both partitions, appends
//! the untouched target column and persists the fitted pipeline.

use crate::artifact::FittedPreprocessor;
use crate::config::{CategoricalImputation, NumericImputation, TransformationConfig};
use crate::error::{Result, ResultExt, TransformationError};
use crate::pipeline::{
    ClosureProgressReporter, ColumnTransformer, Pipeline, ProgressReporter, ProgressUpdate,
    TransformStage,
};
use crate::preprocessing::{
    DEFAULT_FILL_VALUE, ImputeStrategy, OneHotEncoder, SimpleImputer, StandardScaler,
};
use crate::utils::{numeric_values, require_columns};
use ndarray::{Array1, Array2, Axis, concatenate};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Branch name of the numeric sub-pipeline.
pub const NUM_PIPELINE: &str = "num_pipeline";

/// Branch name of the categorical sub-pipeline.
pub const CAT_PIPELINE: &str = "cat_pipeline";

/// What a successful transformation run returns.
#[derive(Debug, Clone)]
pub struct TransformationOutput {
    /// Transformed training features with the target as last column.
    pub train: Array2<f64>,
    /// Transformed test features with the target as last column.
    pub test: Array2<f64>,
    /// Where the fitted pipeline was written.
    pub preprocessor_path: PathBuf,
    /// Names of the feature columns (target excluded).
    pub feature_names: Vec<String>,
}

/// The feature transformation step.
///
/// # Example
///
/// ```rust,ignore
/// use feature_transform::{DataTransformation, TransformationConfig};
///
/// let output = DataTransformation::new(TransformationConfig::default())
///     .initiate_data_transformation("artifacts/train.csv", "artifacts/test.csv")?;
///
/// println!("train matrix: {:?}", output.train.dim());
/// ```
pub struct DataTransformation {
    config: TransformationConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(DataTransformation: Send);

impl DataTransformation {
    pub fn new(config: TransformationConfig) -> Self {
        Self {
            config,
            progress_reporter: None,
        }
    }

    pub fn config(&self) -> &TransformationConfig {
        &self.config
    }

    /// Attach a progress reporter.
    pub fn with_progress(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Attach a closure as progress reporter.
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.with_progress(Arc::new(ClosureProgressReporter::new(callback)))
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Build the unfitted preprocessing pipeline.
    ///
    /// Numeric columns: impute, then standardize. Categorical columns: impute,
    /// then one-hot encode. The numeric branch comes first in the output.
    pub fn get_data_transformer_object(&self) -> Result<ColumnTransformer> {
        self.config
            .validate()
            .map_err(TransformationError::from)
            .context("Building preprocessing pipeline")?;

        let numeric_strategy = match self.config.numeric_imputation {
            NumericImputation::Median => ImputeStrategy::Median,
            NumericImputation::Mean => ImputeStrategy::Mean,
        };
        let categorical_strategy = match self.config.categorical_imputation {
            CategoricalImputation::MostFrequent => ImputeStrategy::MostFrequent,
            CategoricalImputation::Constant => {
                ImputeStrategy::Constant(DEFAULT_FILL_VALUE.to_string())
            }
        };

        let num_pipeline = Pipeline::new()
            .step("imputer", SimpleImputer::new(numeric_strategy))
            .step("scaler", StandardScaler::new());
        debug!("Numerical columns: {:?}", self.config.numerical_columns);

        let cat_pipeline = Pipeline::new()
            .step("imputer", SimpleImputer::new(categorical_strategy))
            .step("encoder", OneHotEncoder::new(self.config.handle_unknown));
        debug!("Categorical columns: {:?}", self.config.categorical_columns);

        Ok(ColumnTransformer::new()
            .branch(
                NUM_PIPELINE,
                num_pipeline,
                self.config.numerical_columns.iter().cloned(),
            )
            .branch(
                CAT_PIPELINE,
                cat_pipeline,
                self.config.categorical_columns.iter().cloned(),
            ))
    }

    /// Read the train and test CSV files and run [`transform`](Self::transform)
    /// with the configured target column.
    pub fn initiate_data_transformation(
        &self,
        train_path: impl AsRef<Path>,
        test_path: impl AsRef<Path>,
    ) -> Result<TransformationOutput> {
        let run = || -> Result<TransformationOutput> {
            let train_df = read_csv(train_path.as_ref()).context("Reading train data")?;
            let test_df = read_csv(test_path.as_ref()).context("Reading test data")?;
            info!("Read train and test data completed");
            self.report_progress(ProgressUpdate::new(
                TransformStage::ReadingData,
                format!(
                    "Read {} train rows and {} test rows",
                    train_df.height(),
                    test_df.height()
                ),
            ));

            self.run_transform(&train_df, &test_df, &self.config.target_column)
        };
        self.finish(run())
    }

    /// Fit on `train_df`, transform both partitions and persist the pipeline.
    ///
    /// Nothing is written when any check or computation fails.
    pub fn transform(
        &self,
        train_df: &DataFrame,
        test_df: &DataFrame,
        target_column_name: &str,
    ) -> Result<TransformationOutput> {
        self.finish(self.run_transform(train_df, test_df, target_column_name))
    }

    fn finish(&self, result: Result<TransformationOutput>) -> Result<TransformationOutput> {
        match result {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Preprocessor saved to {}",
                    output.preprocessor_path.display()
                )));
                Ok(output)
            }
            Err(e) => {
                error!("Data transformation failed: {}", e);
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn run_transform(
        &self,
        train_df: &DataFrame,
        test_df: &DataFrame,
        target_column_name: &str,
    ) -> Result<TransformationOutput> {
        self.validate_inputs(train_df, test_df, target_column_name)
            .context("Validating input datasets")?;

        info!("Obtaining preprocessing object");
        let mut preprocessor = self.get_data_transformer_object()?;
        self.report_progress(ProgressUpdate::new(
            TransformStage::BuildingPipeline,
            "Preprocessing object obtained",
        ));

        let input_feature_train_df = train_df
            .drop(target_column_name)
            .context("Separating train features")?;
        let target_feature_train =
            target_values(train_df, target_column_name).context("Extracting train target")?;

        let input_feature_test_df = test_df
            .drop(target_column_name)
            .context("Separating test features")?;
        let target_feature_test =
            target_values(test_df, target_column_name).context("Extracting test target")?;

        info!("Applying preprocessing object on training and testing dataframes");
        let input_feature_train_arr = preprocessor
            .fit_transform_to_array(&input_feature_train_df)
            .context("Fitting preprocessor on train data")?;
        let input_feature_test_arr = preprocessor
            .transform_to_array(&input_feature_test_df)
            .context("Transforming test data")?;

        debug!(
            "Preprocessor produces {} features",
            preprocessor
                .n_features_out()
                .context("Counting output features")?
        );

        let train = append_target(input_feature_train_arr, target_feature_train)
            .context("Appending train target")?;
        let test = append_target(input_feature_test_arr, target_feature_test)
            .context("Appending test target")?;
        self.report_progress(ProgressUpdate::new(
            TransformStage::Transforming,
            format!("Train {:?}, test {:?}", train.dim(), test.dim()),
        ));

        let fitted = FittedPreprocessor::new(preprocessor, target_column_name)
            .context("Wrapping fitted preprocessor")?;
        let preprocessor_path = self.config.preprocessor_obj_file_path.clone();
        fitted
            .save(&preprocessor_path)
            .context("Saving preprocessing object")?;
        info!("Saved preprocessing object to {}", preprocessor_path.display());
        self.report_progress(ProgressUpdate::new(
            TransformStage::SavingArtifact,
            "Saved preprocessing object",
        ));

        Ok(TransformationOutput {
            train,
            test,
            preprocessor_path,
            feature_names: fitted.feature_names,
        })
    }

    fn validate_inputs(
        &self,
        train_df: &DataFrame,
        test_df: &DataFrame,
        target_column_name: &str,
    ) -> Result<()> {
        let target = target_column_name.to_string();
        if self.config.numerical_columns.contains(&target)
            || self.config.categorical_columns.contains(&target)
        {
            return Err(crate::config::ConfigValidationError::TargetInFeatures(target).into());
        }

        for (df, dataset) in [(train_df, "train"), (test_df, "test")] {
            require_columns(df, std::iter::once(&target), dataset)?;
            require_columns(df, &self.config.numerical_columns, dataset)?;
            require_columns(df, &self.config.categorical_columns, dataset)?;
            if df.height() == 0 {
                return Err(TransformationError::EmptyDataset(dataset.to_string()));
            }
        }
        Ok(())
    }
}

/// Field values read as missing, in addition to empty fields.
pub const MISSING_VALUE_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Read a CSV file with a header row. Empty fields and the
/// [`MISSING_VALUE_TOKENS`] load as missing values.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let null_values = NullValues::AllColumns(
        MISSING_VALUE_TOKENS
            .iter()
            .map(|token| (*token).into())
            .collect(),
    );
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .context(format!("Reading CSV file {}", path.display()))?;
    debug!("Loaded {} with shape {:?}", path.display(), df.shape());
    Ok(df)
}

fn target_values(df: &DataFrame, target_column_name: &str) -> Result<Array1<f64>> {
    let values = numeric_values(df, target_column_name)?;
    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing > 0 {
        return Err(TransformationError::MissingTarget {
            column: target_column_name.to_string(),
            count: missing,
        });
    }
    Ok(values.into_iter().flatten().collect())
}

fn append_target(features: Array2<f64>, target: Array1<f64>) -> Result<Array2<f64>> {
    let target = target.insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[features.view(), target.view()])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandleUnknown;
    use crate::preprocessing::Transformer;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> TransformationConfig {
        TransformationConfig::builder()
            .preprocessor_path(dir.path().join("artifacts/preprocessor.json"))
            .build()
            .unwrap()
    }

    fn single_row() -> DataFrame {
        df![
            "gender" => ["female"],
            "race_ethnicity" => ["group B"],
            "parental_level_of_education" => ["bachelor's degree"],
            "lunch" => ["standard"],
            "test_preparation_course" => ["none"],
            "math_score" => [72i64],
            "reading_score" => [72i64],
            "writing_score" => [74i64],
        ]
        .unwrap()
    }

    #[test]
    fn test_read_csv_missing_value_tokens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.csv");
        std::fs::write(&path, "reading_score,lunch\n72,standard\nNA,N/A\n80,null\n").unwrap();

        let df = read_csv(&path).unwrap();

        let reading = df.column("reading_score").unwrap();
        assert_eq!(reading.dtype(), &DataType::Int64);
        assert_eq!(reading.null_count(), 1);
        assert_eq!(df.column("lunch").unwrap().null_count(), 2);
    }

    #[test]
    fn test_get_data_transformer_object_layout() {
        let dir = TempDir::new().unwrap();
        let ct = DataTransformation::new(config(&dir))
            .get_data_transformer_object()
            .unwrap();

        assert_eq!(ct.branches().len(), 2);
        assert_eq!(ct.branches()[0].name, NUM_PIPELINE);
        assert_eq!(ct.branches()[1].name, CAT_PIPELINE);
        assert_eq!(
            ct.branches()[0].columns,
            vec!["writing_score", "reading_score"]
        );
        assert!(!ct.is_fitted());
    }

    #[test]
    fn test_single_row_keeps_target_last() {
        let dir = TempDir::new().unwrap();
        let df = single_row();

        let output = DataTransformation::new(config(&dir))
            .transform(&df, &df, "math_score")
            .unwrap();

        // 2 numeric + 5 single-category columns + target
        assert_eq!(output.train.dim(), (1, 8));
        assert_eq!(output.train[[0, 7]], 72.0);
        assert_eq!(output.test[[0, 7]], 72.0);
        // constant columns scale to zero, single categories encode to one
        assert_eq!(output.train[[0, 0]], 0.0);
        assert_eq!(output.train[[0, 2]], 1.0);
        assert!(output.preprocessor_path.exists());
    }

    #[test]
    fn test_missing_target_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let artifact = cfg.preprocessor_obj_file_path.clone();
        let train = single_row();
        let test = single_row().drop("math_score").unwrap();

        let err = DataTransformation::new(cfg)
            .transform(&train, &test, "math_score")
            .unwrap_err();

        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
        assert!(err.to_string().contains("test"));
        assert!(!artifact.exists());
    }

    #[test]
    fn test_target_used_as_feature_rejected() {
        let dir = TempDir::new().unwrap();
        let df = single_row();

        let err = DataTransformation::new(config(&dir))
            .transform(&df, &df, "reading_score")
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let dir = TempDir::new().unwrap();
        let train = single_row();
        let test = single_row().head(Some(0));

        let err = DataTransformation::new(config(&dir))
            .transform(&train, &test, "math_score")
            .unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATASET");
    }

    #[test]
    fn test_null_target_rejected() {
        let dir = TempDir::new().unwrap();
        let mut train = single_row();
        train
            .replace(
                "math_score",
                Series::new("math_score".into(), [Option::<i64>::None]),
            )
            .unwrap();

        let err = DataTransformation::new(config(&dir))
            .transform(&train, &single_row(), "math_score")
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_TARGET");
    }

    #[test]
    fn test_partial_null_target_carries_location() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let artifact = cfg.preprocessor_obj_file_path.clone();
        let mut train = single_row().vstack(&single_row()).unwrap();
        train
            .replace(
                "math_score",
                Series::new("math_score".into(), [Some(72i64), None]),
            )
            .unwrap();

        let err = DataTransformation::new(cfg)
            .transform(&train, &single_row(), "math_score")
            .unwrap_err();

        assert_eq!(err.error_code(), "MISSING_TARGET");
        let location = err.location().expect("context marker");
        assert!(location.file().ends_with("transformation.rs"));
        assert!(err.to_string().contains("Extracting train target"));
        assert!(!artifact.exists());
    }

    #[test]
    fn test_unknown_category_policy() {
        let dir = TempDir::new().unwrap();
        let train = single_row();
        let mut test = single_row();
        test.replace("gender", Series::new("gender".into(), ["male"]))
            .unwrap();

        let err = DataTransformation::new(config(&dir))
            .transform(&train, &test, "math_score")
            .unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CATEGORY");

        let cfg = TransformationConfig::builder()
            .preprocessor_path(dir.path().join("ignore.json"))
            .handle_unknown(HandleUnknown::Ignore)
            .build()
            .unwrap();
        let output = DataTransformation::new(cfg)
            .transform(&train, &test, "math_score")
            .unwrap();
        // gender_female indicator is zero for the unseen "male"
        assert_eq!(output.test[[0, 2]], 0.0);
        assert_eq!(output.train[[0, 2]], 1.0);
    }
}
