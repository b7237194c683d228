use std::fs;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;

/// Write a zip archive at `path` with the given `(entry_name, content)`
/// pairs. Entry names use `/` separators.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create zip parent dir");
    }

    let file = fs::File::create(path).expect("create zip file");
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, content) in entries {
        writer.start_file(*name, options).expect("start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("write zip entry");
    }

    writer.finish().expect("finish zip");
}

/// A small two-split dataset wrapped in one top-level directory, with a
/// malformed label line and an image that has no label file.
pub fn write_sample_dataset_zip(path: &Path) {
    write_zip(
        path,
        &[
            ("dataset/train/images/img1.jpg", "train image one"),
            ("dataset/train/images/img2.png", "train image two"),
            (
                "dataset/train/labels/img1.txt",
                "0 0.5 0.5 0.2 0.3\n1 0.3 0.7 0.1 0.2\n",
            ),
            ("dataset/train/labels/img2.txt", "invalid format\n"),
            ("dataset/valid/images/img3.jpg", "valid image"),
            ("dataset/valid/labels/img3.txt", "2 0.4 0.6 0.15 0.25\n"),
        ],
    );
}
