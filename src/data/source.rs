//! Dataset sources for the baseline and current windows.

use std::path::{Path, PathBuf};

use super::frame::FeatureFrame;
use super::json::read_json;
use super::columnar::read_parquet;
use crate::error::{Error, Result};

/// Anything that can produce a feature table, or report that none exists yet.
pub trait DatasetSource: Send + Sync {
    /// Load the dataset. `Ok(None)` means the dataset is absent, which is
    /// an expected state (e.g. before the first baseline snapshot).
    fn load(&self) -> Result<Option<FeatureFrame>>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// A dataset file, read according to its extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDataset {
    path: PathBuf,
}

impl FileDataset {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for FileDataset {
    fn load(&self) -> Result<Option<FeatureFrame>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let frame = match ext.as_str() {
            "parquet" | "pq" => read_parquet(&self.path)?,
            "json" => read_json(&self.path)?,
            other => {
                return Err(Error::Dataset(format!(
                    "{}: unsupported extension '{other}'",
                    self.path.display()
                )))
            }
        };
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An in-memory dataset, mainly for embedding and tests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryDataset {
    frame: Option<FeatureFrame>,
}

impl MemoryDataset {
    pub fn new(frame: FeatureFrame) -> Self {
        Self { frame: Some(frame) }
    }

    /// A source that reports the dataset as absent
    pub fn absent() -> Self {
        Self { frame: None }
    }
}

impl DatasetSource for MemoryDataset {
    fn load(&self) -> Result<Option<FeatureFrame>> {
        Ok(self.frame.clone())
    }

    fn describe(&self) -> String {
        match &self.frame {
            Some(f) => format!("<memory: {} rows>", f.len()),
            None => "<memory: absent>".to_string(),
        }
    }
}
