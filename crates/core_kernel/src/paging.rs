//! Page arithmetic for listing operations
//!
//! Callers ask for 1-based page numbers. Stores want a 0-based offset and a
//! row count, so `Page` converts between the two and clamps anything below
//! the first page.

use serde::{Deserialize, Serialize};

/// A 1-based page request of a fixed size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    /// Creates a page request
    ///
    /// Page numbers of zero or below are treated as the first page.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_kernel::Page;
    ///
    /// let page = Page::new(3, 10);
    /// assert_eq!(page.skip(), 20);
    /// assert_eq!(Page::new(-4, 10).skip(), 0);
    /// ```
    pub fn new(number: i64, size: u32) -> Self {
        let number = number.clamp(1, i64::from(u32::MAX)) as u32;
        Self { number, size }
    }

    /// Returns the first page of the given size
    pub fn first(size: u32) -> Self {
        Self { number: 1, size }
    }

    /// The 1-based page number after clamping
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Rows per page
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of rows to skip: `(number - 1) * size`
    pub fn skip(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }

    /// Number of rows to take
    pub fn take(&self) -> u64 {
        u64::from(self.size)
    }

    /// The page after this one
    pub fn next(&self) -> Self {
        Self {
            number: self.number.saturating_add(1),
            size: self.size,
        }
    }
}
