//! Offset pagination over filtered registry reads.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Zero-based page request. Sizes are clamped to `1..=MAX_PAGE_SIZE`;
/// a zero size falls back to [`DEFAULT_PAGE_SIZE`].
///
/// Only [`PageRequest::new`] builds one, so `page_size` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_index: usize,
    page_size: usize,
}

impl PageRequest {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        let page_size = match page_size {
            0 => DEFAULT_PAGE_SIZE,
            size => size.min(MAX_PAGE_SIZE),
        };
        Self {
            page_index,
            page_size,
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        self.page_index.saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page_index: usize,
    pub page_size: usize,
    pub total_size: i64,
    pub total_page: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total_size: i64) -> Self {
        let size = i64::try_from(request.page_size.max(1)).unwrap_or(i64::MAX);
        let total_page = if total_size <= 0 {
            0
        } else {
            total_size / size + i64::from(total_size % size != 0)
        };
        Self {
            data,
            page_index: request.page_index,
            page_size: request.page_size,
            total_size,
            total_page,
        }
    }

    /// Projects every row while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_size: self.total_size,
            total_page: self.total_page,
        }
    }
}
