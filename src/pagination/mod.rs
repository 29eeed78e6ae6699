//! Pagination module
//!
//! Remote tables are read in fixed row windows (`offset`/`limit`). The
//! paginator decides the next window from the size of the page just
//! received and tracks progress in a `PaginationState`.

mod range;
mod types;

pub use range::RangePaginator;
pub use types::{NextPage, PageRange, PaginationState};
