//! Table query description

use crate::pagination::PageRange;

/// Strict lower bound on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreaterThan {
    pub column: String,
    pub value: String,
}

/// A select-all read of one remote table, optionally windowed and filtered
///
/// ```rust,ignore
/// let query = TableQuery::select_all("sales")
///     .range(PageRange::new(0, 1000))
///     .greater_than("date", "2023-01-31");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    range: Option<PageRange>,
    filter: Option<GreaterThan>,
}

impl TableQuery {
    /// Read every column of a table
    pub fn select_all(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            range: None,
            filter: None,
        }
    }

    /// Restrict to a window of rows
    #[must_use]
    pub fn range(mut self, range: PageRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Keep rows whose `column` is strictly greater than `value`
    #[must_use]
    pub fn greater_than(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(GreaterThan {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn window(&self) -> Option<PageRange> {
        self.range
    }

    pub fn filter(&self) -> Option<&GreaterThan> {
        self.filter.as_ref()
    }
}
