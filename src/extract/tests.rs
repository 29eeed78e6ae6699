//! Tests for the extract module

use super::*;
use crate::error::{Error, Result};
use crate::frame::{Cell, Frame};
use crate::remote::{RemoteTableClient, TableQuery};
use crate::types::{JsonValue, SyncMode};
use async_trait::async_trait;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Mutex;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Serves a fixed table, honoring range and greater-than filters, and
/// records every query it sees
struct InMemoryClient {
    rows: Vec<JsonValue>,
    queries: Mutex<Vec<TableQuery>>,
    fail: bool,
}

impl InMemoryClient {
    fn new(rows: Vec<JsonValue>) -> Self {
        Self {
            rows,
            queries: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    fn queries(&self) -> Vec<TableQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteTableClient for InMemoryClient {
    async fn execute(&self, query: &TableQuery) -> Result<Vec<JsonValue>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(Error::http_status(500, "boom"));
        }
        let filtered: Vec<JsonValue> = self
            .rows
            .iter()
            .filter(|row| match query.filter() {
                Some(f) => row[&f.column].as_str().is_some_and(|v| v > f.value.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        let range = query.window().unwrap();
        Ok(filtered
            .into_iter()
            .skip(range.offset)
            .take(range.limit)
            .collect())
    }
}

fn daily_rows(start: NaiveDate, count: usize) -> Vec<JsonValue> {
    start
        .iter_days()
        .take(count)
        .enumerate()
        .map(|(i, day)| json!({"date": day.format("%Y-%m-%d").to_string(), "units": i}))
        .collect()
}

// ============================================================================
// Fetcher Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_full_table_in_two_pages() {
    let client = InMemoryClient::new(daily_rows(d(2020, 1, 1), 1200));
    let fetcher = IncrementalFetcher::new(&client, 1000, "date");

    let fetched = fetcher.fetch_new_rows("sales", None).await.unwrap();

    assert_eq!(fetched.rows.len(), 1200);
    assert_eq!(fetched.pages, 2);
    assert_eq!(fetched.mode, SyncMode::FullRefresh);

    let queries = client.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].window().unwrap().offset, 0);
    assert_eq!(queries[1].window().unwrap().offset, 1000);
    assert!(queries.iter().all(|q| q.filter().is_none()));
}

#[tokio::test]
async fn test_fetch_empty_first_page() {
    let client = InMemoryClient::new(Vec::new());
    let fetcher = IncrementalFetcher::new(&client, 1000, "date");

    let fetched = fetcher.fetch_new_rows("sales", None).await.unwrap();
    assert!(fetched.rows.is_empty());
    assert_eq!(client.queries().len(), 1);
}

#[tokio::test]
async fn test_fetch_with_cursor_requests_strictly_greater_keys() {
    let client = InMemoryClient::new(daily_rows(d(2023, 1, 1), 11));
    let fetcher = IncrementalFetcher::new(&client, 1000, "date");

    let fetched = fetcher
        .fetch_new_rows("sales", Some(d(2023, 1, 10)))
        .await
        .unwrap();

    assert_eq!(fetched.mode, SyncMode::Incremental);
    assert_eq!(fetched.rows, vec![json!({"date": "2023-01-11", "units": 10})]);
    let filter = client.queries()[0].filter().cloned().unwrap();
    assert_eq!(filter.column, "date");
    assert_eq!(filter.value, "2023-01-10");
}

#[tokio::test]
async fn test_fetch_failure_is_connectivity_error() {
    let client = InMemoryClient::failing();
    let fetcher = IncrementalFetcher::new(&client, 1000, "date");

    let err = fetcher.fetch_new_rows("sales", None).await.unwrap_err();
    assert!(matches!(err, Error::Connectivity { ref table, .. } if table == "sales"));
}

#[test]
fn test_to_frame_parses_temporal_column() {
    let client = InMemoryClient::new(Vec::new());
    let fetcher = IncrementalFetcher::new(&client, 1000, "date");

    let frame = fetcher.to_frame(&[
        json!({"date": "2023-01-01T00:00:00+00:00", "units": 1}),
        json!({"date": "garbage", "units": 2}),
    ]);
    assert_eq!(frame.cell(0, 0), &Cell::Date(d(2023, 1, 1)));
    assert_eq!(frame.cell(1, 0), &Cell::from("garbage"));
}

// ============================================================================
// Merger Tests
// ============================================================================

fn snapshot(days: &[(NaiveDate, i64)]) -> Frame {
    Frame::from_rows(
        vec!["date".into(), "units".into()],
        days.iter()
            .map(|(day, units)| vec![Cell::Date(*day), Cell::Int(*units)])
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_merge_empty_incoming_is_unchanged() {
    let merger = SnapshotMerger::new("date");
    let existing = snapshot(&[(d(2023, 1, 1), 1)]);
    assert!(merger
        .merge(Some(&existing), &Frame::new(vec!["date".into()]))
        .is_unchanged());
}

#[test]
fn test_merge_without_existing() {
    let merger = SnapshotMerger::new("date");
    let incoming = snapshot(&[(d(2023, 1, 2), 2), (d(2023, 1, 1), 1)]);
    match merger.merge(None, &incoming) {
        MergeOutcome::Merged {
            frame,
            added,
            replaced,
        } => {
            assert_eq!(added, 2);
            assert_eq!(replaced, 0);
            assert_eq!(frame.cell(0, 0), &Cell::Date(d(2023, 1, 1)));
        }
        MergeOutcome::Unchanged => panic!("Expected Merged"),
    }
}

#[test]
fn test_merge_incoming_row_wins_and_keys_stay_unique() {
    let merger = SnapshotMerger::new("date");
    let existing = snapshot(&[(d(2023, 1, 1), 1), (d(2023, 1, 2), 2)]);
    let incoming = snapshot(&[(d(2023, 1, 2), 20), (d(2023, 1, 3), 3)]);

    let MergeOutcome::Merged {
        frame,
        added,
        replaced,
    } = merger.merge(Some(&existing), &incoming)
    else {
        panic!("Expected Merged");
    };

    assert_eq!(frame.num_rows(), 3);
    assert_eq!(added, 1);
    assert_eq!(replaced, 1);
    assert_eq!(frame.duplicate_value_count(0), 0);
    assert_eq!(frame.cell(1, 1), &Cell::Int(20));
}

#[test]
fn test_merge_is_idempotent_for_known_keys() {
    let merger = SnapshotMerger::new("date");
    let existing = snapshot(&[(d(2023, 1, 1), 1), (d(2023, 1, 2), 2)]);

    let MergeOutcome::Merged { frame, added, .. } = merger.merge(Some(&existing), &existing) else {
        panic!("Expected Merged");
    };
    assert_eq!(added, 0);
    assert_eq!(frame, existing);
}

#[test]
fn test_merge_unions_columns_existing_first() {
    let merger = SnapshotMerger::new("date");
    let existing = snapshot(&[(d(2023, 1, 1), 1)]);
    let incoming = Frame::from_rows(
        vec!["extra".into(), "date".into()],
        vec![vec![Cell::from("x"), Cell::Date(d(2023, 1, 2))]],
    )
    .unwrap();

    let MergeOutcome::Merged { frame, .. } = merger.merge(Some(&existing), &incoming) else {
        panic!("Expected Merged");
    };
    assert_eq!(frame.columns(), ["date", "units", "extra"]);
    assert_eq!(frame.cell(0, 2), &Cell::Null);
    assert_eq!(frame.cell(1, 1), &Cell::Null);
}
