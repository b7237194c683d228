//! Split layout validation for extracted YOLO datasets.
//!
//! A dataset root is considered valid when at least one split directory
//! (`train`, `valid`, or `test`) contains both an `images/` and a `labels/`
//! subdirectory. Incomplete splits (one subdirectory without the other) are
//! ignored rather than rejected, so a partially assembled `test/` tree does
//! not fail an upload that carries a complete `train/` tree.

use std::fmt;
use std::path::Path;

use crate::error::YolodexError;

/// Directory groups listed in the `InvalidStructure` error message.
pub const REQUIRED_GROUPS: &str = "(train/images + train/labels), \
     (valid/images + valid/labels), (test/images + test/labels)";

/// A named dataset partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    /// All splits in the fixed processing order used by the indexer.
    pub const ORDER: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    /// Directory name of this split under the dataset root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }

    /// Whether both `<root>/<split>/images` and `<root>/<split>/labels`
    /// exist as directories.
    pub fn is_present(self, root: &Path) -> bool {
        let split_dir = root.join(self.dir_name());
        split_dir.join("images").is_dir() && split_dir.join("labels").is_dir()
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Validate the dataset root and return the present splits in processing
/// order.
///
/// Fails with [`YolodexError::InvalidStructure`] when no complete split
/// group exists under `root`.
pub fn validate_layout(root: &Path) -> Result<Vec<Split>, YolodexError> {
    let present: Vec<Split> = Split::ORDER
        .into_iter()
        .filter(|split| split.is_present(root))
        .collect();

    if present.is_empty() {
        return Err(YolodexError::InvalidStructure {
            root: root.to_path_buf(),
        });
    }

    Ok(present)
}
