//! Archive normalization for uploaded datasets.
//!
//! Uploaded datasets arrive as a single flat zip. Some tools wrap the whole
//! dataset in one top-level directory, others place `train/`, `valid/` etc.
//! directly at the archive root. This module extracts the archive and detects
//! which shape it has, so downstream validation always receives the
//! effective dataset root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use std::collections::BTreeSet;

use crate::error::YolodexError;

/// Extract `archive_path` into `dest_dir` and detect the dataset root.
///
/// Returns `Some(dest_dir/<name>)` when every nested entry in the archive
/// lives under exactly one top-level directory `<name>`. Returns `None`
/// otherwise (zero or multiple top-level directories, all-flat archives,
/// empty archives), in which case `dest_dir` itself is the dataset root.
///
/// Flat top-level files do not count toward the top-level directory set, so
/// a `dataset/` tree accompanied by a stray `readme.txt` still normalizes to
/// `dest_dir/dataset`.
pub fn extract_archive(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Option<PathBuf>, YolodexError> {
    if !archive_path.exists() {
        return Err(YolodexError::ArchiveNotFound {
            path: archive_path.to_path_buf(),
        });
    }

    let file = fs::File::open(archive_path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|source| YolodexError::CorruptArchive {
            path: archive_path.to_path_buf(),
            source,
        })?;

    let mut top_level: BTreeSet<String> = BTreeSet::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|source| YolodexError::CorruptArchive {
                path: archive_path.to_path_buf(),
                source,
            })?;

        if entry.name().contains('/') {
            if let Some(first) = entry.name().split('/').next() {
                if !first.is_empty() {
                    top_level.insert(first.to_string());
                }
            }
        }

        // enclosed_name() rejects entries that would escape dest_dir.
        let Some(rel_path) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dest_dir.join(rel_path);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = fs::File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;
    }

    if top_level.len() == 1 {
        let name = top_level.into_iter().next().expect("checked len == 1");
        Ok(Some(dest_dir.join(name)))
    } else {
        Ok(None)
    }
}
