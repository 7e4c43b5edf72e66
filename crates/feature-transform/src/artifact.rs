//! Persistence of fitted objects.
//!
//! Objects are written as pretty-printed JSON. A write goes to a temporary
//! sibling file first and is renamed into place, so a reader never sees a
//! half-written artifact. Concurrent runs targeting the same path race and the
//! last writer wins.

use crate::error::{Result, ResultExt, TransformationError};
use crate::pipeline::ColumnTransformer;
use crate::preprocessing::Transformer;
use chrono::Local;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Serialize `obj` to `path`, creating missing parent directories.
pub fn save_object<T: Serialize>(path: impl AsRef<Path>, obj: &T) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context(format!(
            "Creating artifact directory {}",
            parent.display()
        ))?;
    }

    let content = serde_json::to_string_pretty(obj)?;
    let tmp_path = temp_sibling(path);
    let written = write_synced(&tmp_path, content.as_bytes()).and_then(|()| {
        fs::rename(&tmp_path, path).context(format!("Moving artifact to {}", path.display()))
    });
    if let Err(e) = written {
        if tmp_path.exists()
            && let Err(cleanup) = fs::remove_file(&tmp_path)
        {
            warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
        }
        return Err(e);
    }

    debug!("Saved object to {}", path.display());
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).context(format!("Creating artifact file {}", path.display()))?;
    file.write_all(bytes)
        .context(format!("Writing artifact file {}", path.display()))?;
    file.sync_all()
        .context(format!("Syncing artifact file {}", path.display()))?;
    Ok(())
}

/// Deserialize an object previously written by [`save_object`].
pub fn load_object<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).context(format!("Opening artifact {}", path.display()))?;
    let obj = serde_json::from_reader(BufReader::new(file))?;
    Ok(obj)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// The fitted preprocessing pipeline as persisted for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    /// Target column the pipeline was fitted alongside (never an input).
    pub target_column: String,

    /// Output column names, in matrix order.
    pub feature_names: Vec<String>,

    /// Local time the pipeline was fitted.
    pub fitted_at: String,

    pub transformer: ColumnTransformer,
}

impl FittedPreprocessor {
    /// Wrap a fitted transformer.
    pub fn new(transformer: ColumnTransformer, target_column: impl Into<String>) -> Result<Self> {
        if !transformer.is_fitted() {
            return Err(TransformationError::NotFitted("ColumnTransformer".to_string()));
        }
        Ok(Self {
            target_column: target_column.into(),
            feature_names: transformer.feature_names_out()?,
            fitted_at: Local::now().to_rfc3339(),
            transformer,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_object(path, self)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let preprocessor: FittedPreprocessor = load_object(path)?;
        info!(
            "Loaded preprocessor from {} ({} output features)",
            path.display(),
            preprocessor.feature_names.len()
        );
        Ok(preprocessor)
    }

    /// Apply the persisted pipeline to new rows. The target column, when
    /// present, is ignored.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        self.transformer
            .transform_to_array(df)
            .context("Applying persisted preprocessor")
    }
}
