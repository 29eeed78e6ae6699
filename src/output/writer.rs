//! Parquet reading and writing for frames
//!
//! Every write replaces the target file wholesale.

use super::schema::{arrow_to_frame, frame_to_arrow};
use crate::error::{Error, Result};
use crate::frame::Frame;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024,
        }
    }
}

impl ParquetWriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use no compression
    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Write a single RecordBatch to a Parquet file
pub fn write_batch_to_parquet(
    path: impl AsRef<Path>,
    batch: &RecordBatch,
    config: Option<&ParquetWriterConfig>,
) -> Result<usize> {
    let default_config = ParquetWriterConfig::default();
    let config = config.unwrap_or(&default_config);

    let file = File::create(path.as_ref()).map_err(|e| Error::Output {
        message: format!("Failed to create {}: {e}", path.as_ref().display()),
    })?;

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(config.build_properties()))
        .map_err(|e| Error::Output {
            message: format!("Failed to create Parquet writer: {e}"),
        })?;

    writer.write(batch).map_err(|e| Error::Output {
        message: format!("Failed to write batch: {e}"),
    })?;

    writer.close().map_err(|e| Error::Output {
        message: format!("Failed to close Parquet writer: {e}"),
    })?;

    Ok(batch.num_rows())
}

/// Write a frame to a Parquet file, optionally marking an index column
pub fn write_frame(path: impl AsRef<Path>, frame: &Frame, index: Option<&str>) -> Result<usize> {
    let batch = frame_to_arrow(frame, index)?;
    write_batch_to_parquet(path, &batch, None)
}

/// Read a Parquet file into a frame
///
/// Returns the frame and its recorded index column, if any.
pub fn read_frame(path: impl AsRef<Path>) -> Result<(Frame, Option<String>)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    arrow_to_frame(&schema, &batches)
}
