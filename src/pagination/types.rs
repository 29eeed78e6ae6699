//! Pagination types
//!
//! Page windows and the state tracked while walking a remote table.

/// An inclusive-start window of rows: `offset .. offset + limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// Index of the first row in the window
    pub offset: usize,
    /// Number of rows requested
    pub limit: usize,
}

impl PageRange {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Index of the last row in the window, inclusive
    pub fn last_index(&self) -> usize {
        (self.offset + self.limit).saturating_sub(1)
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// Request this window next
    Continue(PageRange),
    /// No more pages
    Done,
}

impl NextPage {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Offset of the next window
    pub offset: usize,
    /// Page requests issued so far
    pub pages_fetched: usize,
    /// Total rows received so far
    pub total_fetched: usize,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Record a received page
    pub fn add_page(&mut self, rows: usize) {
        self.pages_fetched += 1;
        self.total_fetched += rows;
    }

    /// Move the window forward
    pub fn add_offset(&mut self, amount: usize) {
        self.offset += amount;
    }
}
