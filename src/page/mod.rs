//! Pagination over an annotation index.
//!
//! Pages are slices of the index in its insertion order, which the indexer
//! keeps stable across runs. Requests beyond the last page fail, with one
//! exception: an empty dataset has zero pages, and any page request against
//! it returns an empty page instead of failing.

use serde::{Deserialize, Serialize};

use crate::error::YolodexError;
use crate::index::{AnnotationIndex, ImageAnnotation};

/// Page size used when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of image annotations plus paging metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page {
    pub images: Vec<ImageAnnotation>,
    pub total_images: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
}

/// Return page `page` (1-based) of the index.
///
/// `total_pages` is `ceil(total_images / page_size)`. Fails with
/// [`YolodexError::PageOutOfRange`] when the dataset has at least one page
/// and `page` lies beyond it. `page >= 1` is a boundary precondition; the
/// CLI enforces it before calling in.
pub fn paginate(
    index: &AnnotationIndex,
    page: usize,
    page_size: usize,
) -> Result<Page, YolodexError> {
    debug_assert!(page >= 1, "page numbers are 1-based");
    debug_assert!(page_size >= 1, "page size must be positive");

    let total_images = index.len();
    let total_pages = total_images.div_ceil(page_size);

    if total_pages > 0 && page > total_pages {
        return Err(YolodexError::PageOutOfRange { page, total_pages });
    }

    let start = (page - 1) * page_size;
    let images: Vec<ImageAnnotation> = index
        .iter()
        .skip(start)
        .take(page_size)
        .map(|(image_name, labels)| ImageAnnotation {
            image_name: image_name.to_string(),
            labels: labels.to_vec(),
        })
        .collect();

    Ok(Page {
        images,
        total_images,
        total_pages,
        current_page: page,
        page_size,
    })
}
