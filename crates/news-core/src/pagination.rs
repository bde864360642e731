//! Page-number pagination.

use crate::error::DomainError;

/// A requested page: 1-based number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub per_page: u64,
}

impl PageRequest {
    /// Parse the `page` query parameter. Missing means the first page.
    pub fn parse(raw: Option<&str>, per_page: u64) -> Result<Self, DomainError> {
        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some(value) => match value.parse::<u64>() {
                Ok(n) if n >= 1 => n,
                Ok(_) => {
                    return Err(DomainError::InvalidPage(
                        "That page number is less than 1".to_string(),
                    ));
                }
                Err(_) => {
                    return Err(DomainError::InvalidPage(
                        "That page number is not an integer".to_string(),
                    ));
                }
            },
        };
        Ok(Self {
            number,
            per_page: per_page.max(1),
        })
    }

    pub fn first(per_page: u64) -> Self {
        Self {
            number: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    /// Number of pages for `total` items. An empty collection still has one page.
    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page).max(1)
    }

    /// Reject pages past the end of a collection of `total` items.
    pub fn check(&self, total: u64) -> Result<(), DomainError> {
        if self.number > self.num_pages(total) {
            return Err(DomainError::InvalidPage(
                "That page contains no results".to_string(),
            ));
        }
        Ok(())
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            number: request.number,
            num_pages: request.num_pages(total),
            total,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
