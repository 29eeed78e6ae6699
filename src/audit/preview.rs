//! Row preview for reports

use crate::frame::Frame;
use crate::types::JsonObject;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

const PREVIEW_ROWS: usize = 3;
const PREVIEW_SEED: u64 = 42;

/// A few rows of a snapshot, rendered as JSON records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Preview {
    Rows {
        first_3_rows: Vec<JsonObject>,
        last_3_rows: Vec<JsonObject>,
        sample_3_rows: Vec<JsonObject>,
    },
    Empty {
        message: String,
    },
}

/// First, last and randomly sampled rows
///
/// The sample uses a fixed seed so the same snapshot always previews the
/// same rows.
pub fn preview(frame: &Frame) -> Preview {
    if frame.is_empty() {
        return Preview::Empty {
            message: "The snapshot is empty".to_string(),
        };
    }

    let mut rng = StdRng::seed_from_u64(PREVIEW_SEED);
    let amount = PREVIEW_ROWS.min(frame.num_rows());
    let picks = rand::seq::index::sample(&mut rng, frame.num_rows(), amount).into_vec();

    Preview::Rows {
        first_3_rows: frame.head(PREVIEW_ROWS).to_records(),
        last_3_rows: frame.tail(PREVIEW_ROWS).to_records(),
        sample_3_rows: frame.take(&picks).to_records(),
    }
}
