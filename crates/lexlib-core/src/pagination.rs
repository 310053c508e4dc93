//! Page requests and page windows.
//!
//! Pages are 1-indexed. The row total always comes from the backend's
//! `total_rows` column, never from the length of a returned page.

use serde::{Deserialize, Serialize};

use crate::defaults::{MAX_PAGE_SIZE, PAGE_SIZE};
use crate::models::{Document, DocumentRow};

/// Requested page. Out-of-range values are normalized on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Page below 1 becomes 1; page size is clamped into `[1, MAX_PAGE_SIZE]`.
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.clamp(1, u32::MAX as i64) as u32,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE as i64) as u32,
        }
    }

    /// Build from optional query parameters.
    pub fn from_query(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self::new(page.unwrap_or(1), page_size.unwrap_or(PAGE_SIZE as i64))
    }

    /// Zero-based row offset of the first row on this page.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

/// Position of a page within a result set of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub current_page: u32,
    pub page_size: u32,
    pub total_rows: u64,
    pub total_pages: u32,
}

impl PageWindow {
    /// Compute the window for `request` over `total_rows` rows, clamping the
    /// current page into `[1, max(total_pages, 1)]`.
    pub fn new(request: PageRequest, total_rows: u64) -> Self {
        let page_size = request.page_size.max(1);
        let total_pages = total_rows.div_ceil(page_size as u64).min(u32::MAX as u64) as u32;
        let current_page = request.page.clamp(1, total_pages.max(1));
        Self {
            current_page,
            page_size,
            total_rows,
            total_pages,
        }
    }

    /// Whether the requested page had to be moved to fit the result set.
    pub fn was_clamped(&self, request: PageRequest) -> bool {
        self.current_page != request.page
    }

    pub fn offset(&self) -> u64 {
        (self.current_page as u64 - 1) * self.page_size as u64
    }

    pub fn next_page(&self) -> Option<u32> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }

    pub fn previous_page(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    /// The request that addresses this window's current page.
    pub fn request(&self) -> PageRequest {
        PageRequest {
            page: self.current_page,
            page_size: self.page_size,
        }
    }
}

/// One page of documents plus its window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub pagination: PageWindow,
}

impl DocumentPage {
    /// Assemble a page from backend rows.
    ///
    /// The total is read from the rows' `total_rows` column (0 when there are
    /// no rows).
    pub fn from_rows(rows: Vec<DocumentRow>, request: PageRequest) -> Self {
        let total_rows = rows.first().map(|r| r.total_rows.max(0) as u64).unwrap_or(0);
        Self {
            documents: rows.into_iter().map(|r| r.document).collect(),
            pagination: PageWindow::new(request, total_rows),
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self {
            documents: Vec::new(),
            pagination: PageWindow::new(request, 0),
        }
    }
}
