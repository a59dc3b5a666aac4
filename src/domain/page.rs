//! Pagination: the requested window and the resulting page.

use crate::error::DataError;
use serde::{Deserialize, Serialize};

/// A page window: zero-based index and a positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u64 = 20;

    /// Fails with `InvalidArgument` when `page < 0`, `size <= 0`, or the
    /// offset `page * size` does not fit in an `i64`.
    pub fn new(page: i64, size: i64) -> Result<Self, DataError> {
        if page < 0 {
            return Err(DataError::invalid_argument(format!(
                "page index must not be negative, got {}",
                page
            )));
        }
        if size <= 0 {
            return Err(DataError::invalid_argument(format!(
                "page size must be greater than 0, got {}",
                size
            )));
        }
        if page.checked_mul(size).is_none() {
            return Err(DataError::invalid_argument(format!(
                "page {} of size {} is out of range",
                page, size
            )));
        }
        Ok(PageRequest {
            page: page as u64,
            size: size as u64,
        })
    }

    pub fn of_size(size: i64) -> Result<Self, DataError> {
        PageRequest::new(0, size)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// `new` bounds this by `i64::MAX`.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    pub fn first(&self) -> Self {
        PageRequest { page: 0, size: self.size }
    }

    /// The following window, or `self` when its offset would leave the `i64` range.
    pub fn next(&self) -> Self {
        let page = self
            .page
            .checked_add(1)
            .filter(|p| p.checked_mul(self.size).is_some_and(|o| o <= i64::MAX as u64));
        match page {
            Some(page) => PageRequest { page, size: self.size },
            None => *self,
        }
    }

    /// The previous window, or `self` when already on the first page.
    pub fn previous(&self) -> Self {
        if self.page == 0 {
            *self
        } else {
            PageRequest {
                page: self.page - 1,
                size: self.size,
            }
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// A slice of a larger result set, positioned by its page request.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    page_request: Option<PageRequest>,
    total_elements: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page_request: Option<PageRequest>, total_elements: Option<u64>) -> Self {
        Page {
            content,
            page_request,
            total_elements,
        }
    }

    /// Unpaged result: the whole content on a single page.
    pub fn unpaged(content: Vec<T>) -> Self {
        let total = content.len() as u64;
        Page::new(content, None, Some(total))
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn page_request(&self) -> Option<&PageRequest> {
        self.page_request.as_ref()
    }

    pub fn total_elements(&self) -> Option<u64> {
        self.total_elements
    }

    pub fn number(&self) -> u64 {
        self.page_request.map(|r| r.page()).unwrap_or(0)
    }

    pub fn size(&self) -> u64 {
        self.page_request
            .map(|r| r.size())
            .unwrap_or(self.content.len() as u64)
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_pages(&self) -> u64 {
        let size = self.size();
        match self.total_elements {
            Some(total) if size > 0 => total.div_ceil(size),
            _ => 1,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number() + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number() > 0
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn next_page_request(&self) -> Option<PageRequest> {
        let request = self.page_request?;
        self.has_next().then(|| request.next())
    }

    pub fn previous_page_request(&self) -> Option<PageRequest> {
        let request = self.page_request?;
        self.has_previous().then(|| request.previous())
    }

    /// Projects the content, keeping the pagination metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page_request: self.page_request,
            total_elements: self.total_elements,
        }
    }
}
