use std::path::PathBuf;
use thiserror::Error;

use crate::layout::REQUIRED_GROUPS;

/// The main error type for yolodex operations.
#[derive(Debug, Error)]
pub enum YolodexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive not found: {path}")]
    ArchiveNotFound { path: PathBuf },

    #[error("Failed to open {path} as a zip archive: {source}")]
    CorruptArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Unsupported archive '{filename}': expected a .zip file")]
    UnsupportedArchive { filename: String },

    #[error(
        "Invalid dataset structure at {root}: at least one of the following \
         directory groups must exist: {groups}",
        groups = REQUIRED_GROUPS
    )]
    InvalidStructure { root: PathBuf },

    #[error("Page {page} is out of range (dataset has {total_pages} page(s))")]
    PageOutOfRange { page: usize, total_pages: usize },

    #[error("Failed to parse dataset record from {path}: {source}")]
    RecordRead {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write dataset record to {path}: {source}")]
    RecordWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dataset '{name}' already exists")]
    DatasetExists { name: String },

    #[error("Dataset '{name}' not found")]
    DatasetNotFound { name: String },
}
