//! CLI entry point for the feature transformation step.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use feature_transform::{
    DataTransformation, HandleUnknown, TransformationConfig, TransformationOutput,
    init_console_logging, init_file_logging,
};
use ndarray::Array2;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible unknown category policy
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliHandleUnknown {
    /// Fail when the test data holds a category unseen during fit
    Error,
    /// Encode unseen categories as all-zero indicators
    Ignore,
}

impl From<CliHandleUnknown> for HandleUnknown {
    fn from(cli: CliHandleUnknown) -> Self {
        match cli {
            CliHandleUnknown::Error => HandleUnknown::Error,
            CliHandleUnknown::Ignore => HandleUnknown::Ignore,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Feature transformation step",
    long_about = "Fits the preprocessing pipeline on the train split, transforms both splits \
                  and saves the fitted pipeline.\n\n\
                  EXAMPLES:\n  \
                  # Default paths\n  \
                  feature-transform\n\n  \
                  # Custom data and artifact locations\n  \
                  feature-transform --train data/train.csv --test data/test.csv \
                  --artifact out/preprocessor.json\n\n  \
                  # Keep the transformed matrices\n  \
                  feature-transform --output-dir out/"
)]
struct Args {
    /// Path to the training CSV file
    #[arg(long, default_value = "artifacts/train.csv")]
    train: PathBuf,

    /// Path to the test CSV file
    #[arg(long, default_value = "artifacts/test.csv")]
    test: PathBuf,

    /// Target column to predict
    ///
    /// Overrides the value from --config
    #[arg(short, long)]
    target: Option<String>,

    /// Where to write the fitted preprocessor
    ///
    /// Overrides the value from --config
    #[arg(short, long)]
    artifact: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Policy for categories unseen during fit
    ///
    /// Overrides the value from --config
    #[arg(long, value_enum)]
    handle_unknown: Option<CliHandleUnknown>,

    /// Write logs to a timestamped file in this directory instead of the console
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Also write the transformed matrices as train_arr.csv and test_arr.csv
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match &args.log_dir {
        Some(dir) => {
            let log_path = init_file_logging(dir, &args.log_level)?;
            if !args.quiet {
                println!("Logging to {}", log_path.display());
            }
        }
        None => init_console_logging(&args.log_level, args.quiet),
    }

    let config = build_config(&args)?;

    for path in [&args.train, &args.test] {
        if !path.exists() {
            return Err(anyhow!("Input file not found: {}", path.display()));
        }
    }

    let mut transformation = DataTransformation::new(config);
    if !args.quiet {
        transformation = transformation.on_progress(|update| {
            info!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    let output = match transformation.initiate_data_transformation(&args.train, &args.test) {
        Ok(output) => output,
        Err(e) => {
            error!("Feature transformation failed [{}]", e.error_code());
            return Err(e.into());
        }
    };

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
        let target = &transformation.config().target_column;
        write_matrix(&dir.join("train_arr.csv"), &output.train, &output.feature_names, target)?;
        write_matrix(&dir.join("test_arr.csv"), &output.test, &output.feature_names, target)?;
        info!("Transformed matrices written to {}", dir.display());
    }

    print_summary(&output);
    Ok(())
}

fn build_config(args: &Args) -> Result<TransformationConfig> {
    let base = match &args.config {
        Some(path) => TransformationConfig::from_json_file(path)?,
        None => TransformationConfig::default(),
    };

    let mut builder = TransformationConfig::builder()
        .preprocessor_path(base.preprocessor_obj_file_path)
        .target_column(base.target_column)
        .numerical_columns(base.numerical_columns)
        .categorical_columns(base.categorical_columns)
        .numeric_imputation(base.numeric_imputation)
        .categorical_imputation(base.categorical_imputation)
        .handle_unknown(base.handle_unknown);

    if let Some(ref target) = args.target {
        builder = builder.target_column(target);
    }
    if let Some(ref artifact) = args.artifact {
        builder = builder.preprocessor_path(artifact);
    }
    if let Some(policy) = args.handle_unknown {
        builder = builder.handle_unknown(policy.into());
    }

    Ok(builder.build()?)
}

/// Write a transformed matrix with a header row.
fn write_matrix(path: &Path, matrix: &Array2<f64>, feature_names: &[String], target: &str) -> Result<()> {
    let names = feature_names.iter().map(String::as_str).chain(std::iter::once(target));
    let columns: Vec<Column> = names
        .zip(matrix.columns())
        .map(|(name, values)| Column::new(name.into(), values.to_vec()))
        .collect();
    let mut df = DataFrame::new(columns)?;

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    Ok(())
}

/// Print a human-readable summary.
///
/// Uses `println!` so the result is visible regardless of log level.
fn print_summary(output: &TransformationOutput) {
    println!("\n{}", "=".repeat(60));
    println!("FEATURE TRANSFORMATION COMPLETE");
    println!("{}", "=".repeat(60));
    println!("  Train matrix:   {} rows x {} columns", output.train.nrows(), output.train.ncols());
    println!("  Test matrix:    {} rows x {} columns", output.test.nrows(), output.test.ncols());
    println!("  Features:       {}", output.feature_names.len());
    println!("  Preprocessor:   {}", output.preprocessor_path.display());
    println!("{}", "=".repeat(60));
}
