//! Range pagination
//!
//! Walks a table in fixed-size row windows. A short page (fewer rows than
//! the window) is the last one; an empty first page ends immediately.

use super::types::{NextPage, PageRange, PaginationState};

/// Fixed-size window paginator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePaginator {
    page_size: usize,
}

impl RangePaginator {
    /// Create a paginator; a zero page size is treated as one row
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Window for the first request
    pub fn first_page(&self, state: &PaginationState) -> PageRange {
        PageRange::new(state.offset, self.page_size)
    }

    /// Record a received page and decide what comes next
    pub fn process_page(&self, rows_received: usize, state: &mut PaginationState) -> NextPage {
        state.add_page(rows_received);

        if rows_received < self.page_size {
            state.mark_done();
            return NextPage::Done;
        }

        state.add_offset(self.page_size);
        NextPage::Continue(PageRange::new(state.offset, self.page_size))
    }
}

impl Default for RangePaginator {
    fn default() -> Self {
        Self::new(1000)
    }
}
