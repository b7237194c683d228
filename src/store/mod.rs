//! Persistence boundaries: dataset records and canonical image storage.
//!
//! Both stores are plain-filesystem implementations injected into the
//! ingestion pipeline and the query path by the process entry point. The
//! components never own a global handle; callers decide where data lives.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/meta/<dataset>.json        one record per ingested dataset
//! <data_dir>/images/<dataset>/<name>    canonical image bytes
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::YolodexError;
use crate::index::AnnotationIndex;

/// Status value written for every successfully ingested dataset.
pub const STATUS_COMPLETED: &str = "completed";

/// A persisted dataset record. Created once per successful ingestion and
/// never mutated afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub total_images: usize,
    pub images: AnnotationIndex,
}

impl DatasetRecord {
    /// Create a completed record stamped with the current time.
    pub fn completed(name: impl Into<String>, total_images: usize, images: AnnotationIndex) -> Self {
        Self {
            name: name.into(),
            status: STATUS_COMPLETED.to_string(),
            created_at: Utc::now(),
            total_images,
            images,
        }
    }
}

/// A dataset record minus its annotation index, for listings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub total_images: usize,
}

impl From<&DatasetRecord> for DatasetSummary {
    fn from(record: &DatasetRecord) -> Self {
        Self {
            name: record.name.clone(),
            status: record.status.clone(),
            created_at: record.created_at,
            total_images: record.total_images,
        }
    }
}

/// Metadata store for dataset records.
pub trait DatasetStore {
    /// Persist a record. The record becomes visible to readers only once
    /// this returns.
    fn insert(&self, record: &DatasetRecord) -> Result<(), YolodexError>;

    /// Fetch a full record (index included) by dataset name.
    fn get(&self, name: &str) -> Result<Option<DatasetRecord>, YolodexError>;

    /// List summaries of all persisted datasets.
    fn list(&self) -> Result<Vec<DatasetSummary>, YolodexError>;

    /// Whether a record with this name already exists.
    fn contains(&self, name: &str) -> Result<bool, YolodexError>;
}

/// File-backed metadata store: one pretty-printed JSON document per dataset.
#[derive(Clone, Debug)]
pub struct JsonDatasetStore {
    root: PathBuf,
}

impl JsonDatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl DatasetStore for JsonDatasetStore {
    fn insert(&self, record: &DatasetRecord) -> Result<(), YolodexError> {
        fs::create_dir_all(&self.root)?;

        let path = self.record_path(&record.name);
        let json = serde_json::to_string_pretty(record).map_err(|source| {
            YolodexError::RecordWrite {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, json)?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<DatasetRecord>, YolodexError> {
        let path = self.record_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        let data = fs::read_to_string(&path)?;
        let record =
            serde_json::from_str(&data).map_err(|source| YolodexError::RecordRead {
                path: path.clone(),
                source,
            })?;
        Ok(Some(record))
    }

    fn list(&self) -> Result<Vec<DatasetSummary>, YolodexError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let data = fs::read_to_string(&path)?;
                let record: DatasetRecord = serde_json::from_str(&data).map_err(|source| {
                    YolodexError::RecordRead {
                        path: path.clone(),
                        source,
                    }
                })?;
                summaries.push(DatasetSummary::from(&record));
            }
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    fn contains(&self, name: &str) -> Result<bool, YolodexError> {
        Ok(self.record_path(name).is_file())
    }
}

/// Canonical, dataset-scoped image storage.
#[derive(Clone, Debug)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dataset_dir(&self, dataset: &str) -> PathBuf {
        self.root.join(dataset)
    }

    /// Copy `src` into the dataset's storage directory unless a file with
    /// the same basename is already there. Dedup is name-based, not
    /// content-based: a same-named but different image never overwrites the
    /// first copy. Returns whether a copy happened.
    pub fn materialize(&self, dataset: &str, src: &Path) -> Result<bool, YolodexError> {
        let file_name = src
            .file_name()
            .ok_or_else(|| YolodexError::Io(std::io::Error::other("source path has no file name")))?;

        let dir = self.dataset_dir(dataset);
        fs::create_dir_all(&dir)?;

        let dest = dir.join(file_name);
        if dest.exists() {
            return Ok(false);
        }

        fs::copy(src, dest)?;
        Ok(true)
    }

    /// Read stored image bytes by exact `(dataset, image_name)`. Returns
    /// `None` when no such image exists.
    pub fn read(&self, dataset: &str, image_name: &str) -> Result<Option<Vec<u8>>, YolodexError> {
        // Names come from archive basenames; anything with a separator is
        // not a stored name.
        if image_name.contains(['/', '\\']) {
            return Ok(None);
        }

        let path = self.dataset_dir(dataset).join(image_name);
        if !path.is_file() {
            return Ok(None);
        }

        Ok(Some(fs::read(path)?))
    }
}
