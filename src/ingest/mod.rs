//! The ingestion pipeline: archive in, persisted dataset record out.
//!
//! Runs the stages sequentially: extract the archive into a uniquely named
//! scratch directory, detect the effective dataset root, validate the split
//! layout, build the annotation index (materializing images into canonical
//! storage), then persist the record. The record is written last, so a
//! dataset becomes visible to readers only after indexing fully completes.
//!
//! The scratch directory is a [`tempfile::TempDir`] and is removed when it
//! drops, on success and on every failure path alike.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::extract_archive;
use crate::error::YolodexError;
use crate::index::build_index;
use crate::layout::validate_layout;
use crate::store::{DatasetRecord, DatasetStore, ImageStore};

/// Settings for a single ingestion run.
#[derive(Clone, Debug)]
pub struct IngestOptions {
    /// Root data directory (`images/`, `meta/`, and `tmp/` live under it).
    pub data_dir: PathBuf,

    /// Dataset name override; defaults to the archive filename stem.
    pub name: Option<String>,
}

/// Ingest a dataset archive and persist its record through `store`.
///
/// Rejects filenames that do not end in `.zip` before touching the archive,
/// and rejects dataset names that already have a persisted record: records
/// are immutable once written.
pub fn ingest_archive(
    archive_path: &Path,
    options: &IngestOptions,
    store: &dyn DatasetStore,
) -> Result<DatasetRecord, YolodexError> {
    let filename = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| YolodexError::UnsupportedArchive {
            filename: archive_path.display().to_string(),
        })?;

    // The extension check applies even with an explicit name override.
    let stem = archive_stem(filename)?;
    let dataset_name = options.name.clone().unwrap_or(stem);

    if store.contains(&dataset_name)? {
        return Err(YolodexError::DatasetExists { name: dataset_name });
    }

    let tmp_root = options.data_dir.join("tmp");
    fs::create_dir_all(&tmp_root)?;

    // Unique per upload, so concurrent ingestions never share scratch space.
    let scratch = tempfile::Builder::new()
        .prefix("ingest-")
        .tempdir_in(&tmp_root)?;

    log::info!("ingesting '{}' from {}", dataset_name, archive_path.display());

    let images = ImageStore::new(options.data_dir.join("images"));
    let result = run_pipeline(archive_path, scratch.path(), &dataset_name, &images, store);

    if result.is_err() {
        // No partial dataset: drop any images materialized before the
        // failure. The existence check above guarantees they are ours.
        let _ = fs::remove_dir_all(options.data_dir.join("images").join(&dataset_name));
    }

    result
}

fn run_pipeline(
    archive_path: &Path,
    scratch: &Path,
    dataset_name: &str,
    images: &ImageStore,
    store: &dyn DatasetStore,
) -> Result<DatasetRecord, YolodexError> {
    let detected_root = extract_archive(archive_path, scratch)?;
    let root = detected_root.as_deref().unwrap_or(scratch);
    log::debug!("extracted archive, dataset root: {}", root.display());

    let splits = validate_layout(root)?;
    log::debug!("found {} split(s)", splits.len());

    let outcome = build_index(root, dataset_name, images)?;
    log::info!(
        "indexed {} image(s) ({} copied) for '{}'",
        outcome.source_images.len(),
        outcome.copied,
        dataset_name
    );

    let record = DatasetRecord::completed(
        dataset_name,
        outcome.source_images.len(),
        outcome.index,
    );
    store.insert(&record)?;

    Ok(record)
}

/// Strip the `.zip` extension, rejecting anything else.
fn archive_stem(filename: &str) -> Result<String, YolodexError> {
    let lowered = filename.to_ascii_lowercase();
    let stem = lowered
        .strip_suffix(".zip")
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| YolodexError::UnsupportedArchive {
            filename: filename.to_string(),
        })?;

    Ok(filename[..stem.len()].to_string())
}
