//! In-memory pagination for lists the upstream cannot page itself.

use serde::{Deserialize, Serialize};

use crate::error::UserInputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationState,
}

/// Slice `list` into the 1-based `page` of `size` items.
///
/// `page == 0` and `size == 0` are rejected. A page past the last one is not
/// clamped: it comes back with empty `data` and metadata describing the list.
pub fn paginate<T: Clone>(list: &[T], page: usize, size: usize) -> Result<Page<T>, UserInputError> {
    if page == 0 {
        return Err(UserInputError::InvalidPage(page));
    }
    if size == 0 {
        return Err(UserInputError::InvalidPageSize);
    }

    let total_count = list.len();
    let total_pages = total_count.div_ceil(size);
    let start = (page - 1).saturating_mul(size).min(total_count);
    let end = page.saturating_mul(size).min(total_count);

    Ok(Page {
        data: list[start..end].to_vec(),
        pagination: PaginationState {
            current_page: page,
            total_pages,
            total_count,
            has_next: end < total_count,
            has_prev: page > 1,
        },
    })
}

/// Every page of `list` in order. Empty for an empty list or zero size.
pub fn pages<T: Clone>(list: &[T], size: usize) -> Vec<Page<T>> {
    if size == 0 {
        return Vec::new();
    }
    let total_pages = list.len().div_ceil(size);
    (1..=total_pages)
        .filter_map(|page| paginate(list, page, size).ok())
        .collect()
}
