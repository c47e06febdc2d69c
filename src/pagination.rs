//! This modules defines the common functionality for paging data.

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of transactions per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// A validated page selection for offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    number: u64,
    /// The maximum number of rows on the page.
    size: u64,
}

impl Page {
    /// Create a page selection from a 1-based page `number` and page `size`.
    ///
    /// # Errors
    /// Returns [Error::InvalidQuery] if either value is zero, or if the page
    /// starts beyond the range SQLite can address.
    pub fn new(number: u64, size: u64) -> Result<Self, Error> {
        if number == 0 {
            return Err(Error::InvalidQuery("page must be 1 or greater".to_owned()));
        }

        if size == 0 {
            return Err(Error::InvalidQuery(
                "perPage must be 1 or greater".to_owned(),
            ));
        }

        let page = Self { number, size };

        if page.checked_offset().is_none() || i64::try_from(size).is_err() {
            return Err(Error::InvalidQuery(format!(
                "page {number} with {size} items per page is out of range"
            )));
        }

        Ok(page)
    }

    /// The 1-based page number.
    pub fn number(self) -> u64 {
        self.number
    }

    /// The maximum number of rows on the page, i.e. the SQL `LIMIT`.
    pub fn limit(self) -> i64 {
        // `new` checks that the size fits.
        self.size as i64
    }

    /// The number of rows to skip, i.e. the SQL `OFFSET`.
    pub fn offset(self) -> i64 {
        // `new` checks that the offset fits.
        self.checked_offset().unwrap_or(i64::MAX)
    }

    fn checked_offset(self) -> Option<i64> {
        (self.number - 1)
            .checked_mul(self.size)
            .and_then(|offset| i64::try_from(offset).ok())
    }
}
