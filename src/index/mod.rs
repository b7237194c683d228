//! Annotation indexing for extracted YOLO datasets.
//!
//! The indexer walks every present split in a fixed order, pairs each image
//! with its label file, parses the label lines, and materializes the image
//! bytes into canonical per-dataset storage. The result is an insertion-
//! ordered index from image basename to bounding-box labels; that order is
//! the pagination order and is an explicit invariant, not an accident of the
//! backing container.
//!
//! Malformed content is handled leniently by design: label lines that do not
//! match the five-token grammar are dropped, images without a label file get
//! an empty label list, and files with unsupported extensions are ignored.
//! A single bad annotation line must never fail an entire upload. Filesystem
//! errors, by contrast, are fatal.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::YolodexError;
use crate::layout::Split;
use crate::store::ImageStore;

/// Image extensions recognized by the indexer (lowercase comparison).
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Number of whitespace-separated tokens in a valid label line.
const LABEL_TOKENS: usize = 5;

/// A single bounding-box annotation, kept as raw tokens.
///
/// No numeric coercion or range validation happens here; the archive's
/// tokens pass through untouched so the index never rejects an upload over a
/// coordinate convention it does not enforce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBoxLabel {
    /// Class identifier, as written in the label file.
    pub class: String,

    /// Bounding-box components `[x, y, w, h]`, as written in the label file.
    pub bbox: [String; 4],
}

/// An image together with its ordered label list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnnotation {
    /// Image basename, extension preserved.
    pub image_name: String,

    /// Labels in source-file line order.
    pub labels: Vec<BoundingBoxLabel>,
}

/// Insertion-ordered mapping from image basename to its labels.
///
/// Re-inserting an existing key overwrites the value but keeps the key's
/// original position, so an image appearing in several splits takes its
/// labels from the last split processed while its page position stays put.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationIndex {
    entries: IndexMap<String, Vec<BoundingBoxLabel>>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed images.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite the labels for `image_name`. An existing key
    /// keeps its original insertion position.
    pub fn insert(&mut self, image_name: String, labels: Vec<BoundingBoxLabel>) {
        self.entries.insert(image_name, labels);
    }

    pub fn get(&self, image_name: &str) -> Option<&[BoundingBoxLabel]> {
        self.entries.get(image_name).map(Vec::as_slice)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BoundingBoxLabel])> {
        self.entries
            .iter()
            .map(|(name, labels)| (name.as_str(), labels.as_slice()))
    }
}

/// Result of indexing one extracted dataset tree.
#[derive(Debug)]
pub struct IndexOutcome {
    /// The accumulated annotation index.
    pub index: AnnotationIndex,

    /// Every qualifying source image path, split duplicates included. This
    /// is the count persisted as `total_images`.
    pub source_images: Vec<PathBuf>,

    /// Number of images actually copied into canonical storage. Zero when
    /// re-indexing an unchanged tree against warm storage.
    pub copied: usize,
}

/// Build the annotation index for the dataset rooted at `root`.
///
/// Walks present splits in `[train, valid, test]` order, skipping absent
/// ones, and copies each newly seen image into `images` under
/// `dataset_name`. Never fails on malformed label content; fails with an IO
/// error when the filesystem misbehaves.
pub fn build_index(
    root: &Path,
    dataset_name: &str,
    images: &ImageStore,
) -> Result<IndexOutcome, YolodexError> {
    let mut index = AnnotationIndex::new();
    let mut source_images = Vec::new();
    let mut copied = 0usize;

    for split in Split::ORDER {
        if !split.is_present(root) {
            continue;
        }

        let split_dir = root.join(split.dir_name());
        let images_dir = split_dir.join("images");
        let labels_dir = split_dir.join("labels");

        for image_path in list_split_images(&images_dir)? {
            let Some(image_name) = image_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let image_name = image_name.to_string();

            let label_path = labels_dir.join(Path::new(&image_name).with_extension("txt"));
            let labels = read_labels(&label_path)?;

            log::debug!(
                "indexed {}/{} with {} label(s)",
                split,
                image_name,
                labels.len()
            );

            index.insert(image_name, labels);
            if images.materialize(dataset_name, &image_path)? {
                copied += 1;
            }
            source_images.push(image_path);
        }
    }

    Ok(IndexOutcome {
        index,
        source_images,
        copied,
    })
}

/// List qualifying image files in a split's `images/` directory, sorted by
/// name so index insertion order is stable across runs.
fn list_split_images(images_dir: &Path) -> Result<Vec<PathBuf>, YolodexError> {
    let mut files = Vec::new();

    for entry in fs::read_dir(images_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// Read a label file into structured labels, preserving line order.
///
/// A missing file yields an empty list; unreadable files are IO errors.
fn read_labels(label_path: &Path) -> Result<Vec<BoundingBoxLabel>, YolodexError> {
    if !label_path.is_file() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(label_path)?;
    Ok(content.lines().filter_map(parse_label_line).collect())
}

/// Parse one label line: `<class> <x> <y> <w> <h>`, whitespace-separated.
///
/// Blank lines and lines with any other token count yield `None`.
fn parse_label_line(line: &str) -> Option<BoundingBoxLabel> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != LABEL_TOKENS {
        return None;
    }

    Some(BoundingBoxLabel {
        class: tokens[0].to_string(),
        bbox: [
            tokens[1].to_string(),
            tokens[2].to_string(),
            tokens[3].to_string(),
            tokens[4].to_string(),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(class: &str, bbox: [&str; 4]) -> BoundingBoxLabel {
        BoundingBoxLabel {
            class: class.to_string(),
            bbox: bbox.map(str::to_string),
        }
    }

    fn write_split_image(root: &Path, split: &str, name: &str, bytes: &[u8]) {
        let dir = root.join(split).join("images");
        fs::create_dir_all(&dir).expect("create images dir");
        fs::create_dir_all(root.join(split).join("labels")).expect("create labels dir");
        fs::write(dir.join(name), bytes).expect("write image");
    }

    fn write_split_label(root: &Path, split: &str, name: &str, content: &str) {
        let dir = root.join(split).join("labels");
        fs::create_dir_all(&dir).expect("create labels dir");
        fs::write(dir.join(name), content).expect("write label");
    }

    #[test]
    fn parse_label_line_accepts_exactly_five_tokens() {
        assert_eq!(
            parse_label_line("0 0.5 0.5 0.2 0.3"),
            Some(label("0", ["0.5", "0.5", "0.2", "0.3"]))
        );
        // Class and coordinates stay raw strings, whatever they contain.
        assert_eq!(
            parse_label_line("cat 1 2 3 4"),
            Some(label("cat", ["1", "2", "3", "4"]))
        );
    }

    #[test]
    fn parse_label_line_drops_everything_else() {
        assert_eq!(parse_label_line(""), None);
        assert_eq!(parse_label_line("   "), None);
        assert_eq!(parse_label_line("invalid format"), None);
        assert_eq!(parse_label_line("0 0.5 0.5"), None);
        assert_eq!(parse_label_line("0 0.1 0.2 0.3 0.4 0.5 0.6"), None);
    }

    #[test]
    fn labels_follow_source_line_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = ImageStore::new(temp.path().join("storage"));

        write_split_image(temp.path(), "train", "img1.jpg", b"bytes");
        write_split_label(
            temp.path(),
            "train",
            "img1.txt",
            "0 0.5 0.5 0.2 0.3\n1 0.3 0.7 0.1 0.2\n",
        );

        let outcome = build_index(temp.path(), "demo", &store).expect("index");
        let labels = outcome.index.get("img1.jpg").expect("entry exists");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].class, "0");
        assert_eq!(labels[1].class, "1");
    }

    #[test]
    fn malformed_lines_yield_empty_label_list() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = ImageStore::new(temp.path().join("storage"));

        write_split_image(temp.path(), "train", "img1.jpg", b"bytes");
        write_split_label(temp.path(), "train", "img1.txt", "invalid format\n0 0.5 0.5\n");

        let outcome = build_index(temp.path(), "demo", &store).expect("index");
        assert_eq!(outcome.index.get("img1.jpg"), Some(&[][..]));
    }

    #[test]
    fn missing_label_file_is_not_an_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = ImageStore::new(temp.path().join("storage"));

        write_split_image(temp.path(), "train", "img.jpg", b"bytes");

        let outcome = build_index(temp.path(), "demo", &store).expect("index");
        assert_eq!(outcome.index.get("img.jpg"), Some(&[][..]));
        assert_eq!(outcome.source_images.len(), 1);
    }

    #[test]
    fn unsupported_extensions_are_ignored() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = ImageStore::new(temp.path().join("storage"));

        write_split_image(temp.path(), "train", "img.jpg", b"bytes");
        write_split_image(temp.path(), "train", "img.JPEG", b"bytes");
        write_split_image(temp.path(), "train", "photo.PNG", b"bytes");
        write_split_image(temp.path(), "train", "notes.txt", b"not an image");
        write_split_image(temp.path(), "train", "clip.gif", b"not supported");

        let outcome = build_index(temp.path(), "demo", &store).expect("index");
        assert_eq!(outcome.index.len(), 3);
        assert!(outcome.index.get("notes.txt").is_none());
        assert!(outcome.index.get("clip.gif").is_none());
    }

    #[test]
    fn later_split_overwrites_labels_but_not_position_or_bytes() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = ImageStore::new(temp.path().join("storage"));

        write_split_image(temp.path(), "train", "dup.jpg", b"train bytes");
        write_split_label(temp.path(), "train", "dup.txt", "0 0.1 0.1 0.1 0.1\n");
        write_split_image(temp.path(), "train", "zz.jpg", b"other");
        write_split_image(temp.path(), "valid", "dup.jpg", b"valid bytes");
        write_split_label(temp.path(), "valid", "dup.txt", "9 0.9 0.9 0.9 0.9\n");

        let outcome = build_index(temp.path(), "demo", &store).expect("index");

        // Labels come from the later split (last write wins).
        let labels = outcome.index.get("dup.jpg").expect("entry exists");
        assert_eq!(labels[0].class, "9");

        // Position stays where the key was first inserted.
        let names: Vec<&str> = outcome.index.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["dup.jpg", "zz.jpg"]);

        // Stored bytes come from the earlier split (first write wins).
        let bytes = store.read("demo", "dup.jpg").expect("read").expect("found");
        assert_eq!(bytes, b"train bytes");

        // Both occurrences count as sources; only two distinct copies.
        assert_eq!(outcome.source_images.len(), 3);
        assert_eq!(outcome.copied, 2);
    }

    #[test]
    fn reindexing_unchanged_tree_copies_nothing() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = ImageStore::new(temp.path().join("storage"));

        write_split_image(temp.path(), "train", "a.jpg", b"a");
        write_split_image(temp.path(), "train", "b.png", b"b");
        write_split_label(temp.path(), "train", "a.txt", "0 0.5 0.5 0.2 0.3\n");

        let first = build_index(temp.path(), "demo", &store).expect("first index");
        assert_eq!(first.copied, 2);

        let second = build_index(temp.path(), "demo", &store).expect("second index");
        assert_eq!(second.copied, 0);
        assert_eq!(second.index, first.index);
        assert_eq!(second.source_images, first.source_images);
    }

    #[test]
    fn splits_are_processed_in_fixed_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let store = ImageStore::new(temp.path().join("storage"));

        write_split_image(temp.path(), "test", "t.jpg", b"t");
        write_split_image(temp.path(), "valid", "v.jpg", b"v");
        write_split_image(temp.path(), "train", "x.jpg", b"x");

        let outcome = build_index(temp.path(), "demo", &store).expect("index");
        let names: Vec<&str> = outcome.index.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["x.jpg", "v.jpg", "t.jpg"]);
    }
}
