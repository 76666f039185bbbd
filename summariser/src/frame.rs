use crate::config::ColumnNames;
use latency_record_model::{Outcome, ReadAttempt};
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Column names of the frame built by [frame_from_records]
pub(crate) mod columns {
    pub const ROUND: &str = "round";
    pub const POSITION: &str = "position";
    pub const OBJECT_NAME: &str = "object_name";
    pub const RESOURCE_KEY: &str = "resource_key";
    pub const LATENCY_MS: &str = "latency_ms";
    pub const FAILED: &str = "failed";
}

#[derive(Error, Debug)]
pub enum MalformedInputError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing required column `{column}`")]
    MissingColumn { column: String },
    #[error("Empty value in column `{column}` at row {row}")]
    MissingValue { column: String, row: usize },
    #[error("Non-numeric value in column `{column}` at row {row}: {value:?}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("Value out of range in column `{column}` at row {row}: {value}")]
    OutOfRange {
        column: String,
        row: usize,
        value: i64,
    },
}

/// Load read attempts from a CSV result log
pub fn load_records_from_path(
    path: &Path,
    columns: &ColumnNames,
    failure_marker: &str,
) -> Result<Vec<ReadAttempt>, MalformedInputError> {
    let file = std::fs::File::open(path)?;
    load_records(file, columns, failure_marker)
}

/// Load read attempts from CSV content.
///
/// The first line must be a header naming every column in `columns`, other columns are ignored.
/// Records are returned in source order. Any missing column or bad value fails the whole load.
pub fn load_records<R: Read>(
    mut reader: R,
    columns: &ColumnNames,
    failure_marker: &str,
) -> Result<Vec<ReadAttempt>, MalformedInputError> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;
    if content.starts_with(UTF8_BOM) {
        content.drain(..UTF8_BOM.len());
    }

    // Everything is read as text so that bad values can be reported with their row
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()?;
    log::trace!("Loaded frame: {}", frame);

    records_from_frame(&frame, columns, failure_marker)
}

fn records_from_frame(
    frame: &DataFrame,
    columns: &ColumnNames,
    failure_marker: &str,
) -> Result<Vec<ReadAttempt>, MalformedInputError> {
    let rounds = positive_column(frame, &columns.round)?;
    let positions = positive_column(frame, &columns.sequence_position)?;
    let object_ids = integer_column(frame, &columns.object_id)?;
    let object_names = text_column(frame, &columns.object_name)?;
    let resource_ids = integer_column(frame, &columns.resource_id)?;
    let resource_labels = text_column(frame, &columns.resource_label)?;
    let delays = integer_column(frame, &columns.delay_ms)?;
    let latencies = integer_column(frame, &columns.latency_ms)?;
    let statuses = text_column(frame, &columns.status)?;

    let mut records = Vec::with_capacity(frame.height());
    for row in 0..frame.height() {
        let latency_ms = u64::try_from(latencies[row]).map_err(|_| {
            MalformedInputError::OutOfRange {
                column: columns.latency_ms.clone(),
                row: row + 1,
                value: latencies[row],
            }
        })?;

        records.push(ReadAttempt {
            round: rounds[row],
            sequence_position: positions[row],
            object_id: object_ids[row],
            object_name: object_names[row].clone(),
            resource_id: resource_ids[row],
            resource_label: resource_labels[row].clone(),
            delay_ms: delays[row],
            latency_ms,
            outcome: Outcome::from_status(&statuses[row], failure_marker),
            status: statuses[row].clone(),
        });
    }

    Ok(records)
}

fn string_chunks<'a>(
    frame: &'a DataFrame,
    column: &str,
) -> Result<&'a StringChunked, MalformedInputError> {
    let values = frame
        .column(column)
        .map_err(|_| MalformedInputError::MissingColumn {
            column: column.to_string(),
        })?;

    Ok(values.str()?)
}

/// Text values, an empty field reads as an empty string
fn text_column(frame: &DataFrame, column: &str) -> Result<Vec<String>, MalformedInputError> {
    Ok(string_chunks(frame, column)?
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect())
}

/// Integer values, rows are numbered from 1 in errors
fn integer_column(frame: &DataFrame, column: &str) -> Result<Vec<i64>, MalformedInputError> {
    string_chunks(frame, column)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| MalformedInputError::MissingValue {
                    column: column.to_string(),
                    row: row + 1,
                })?;

            value
                .parse::<i64>()
                .map_err(|_| MalformedInputError::NonNumeric {
                    column: column.to_string(),
                    row: row + 1,
                    value: value.to_string(),
                })
        })
        .collect()
}

/// Integer values that must be at least 1, such as rounds and sequence positions
fn positive_column(frame: &DataFrame, column: &str) -> Result<Vec<u32>, MalformedInputError> {
    integer_column(frame, column)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            u32::try_from(value)
                .ok()
                .filter(|v| *v >= 1)
                .ok_or_else(|| MalformedInputError::OutOfRange {
                    column: column.to_string(),
                    row: row + 1,
                    value,
                })
        })
        .collect()
}

/// Build a [DataFrame] over the records for the polars based analysis
pub(crate) fn frame_from_records(records: &[ReadAttempt]) -> PolarsResult<DataFrame> {
    df![
        columns::ROUND => records.iter().map(|r| r.round).collect::<Vec<_>>(),
        columns::POSITION => records.iter().map(|r| r.sequence_position).collect::<Vec<_>>(),
        columns::OBJECT_NAME => records.iter().map(|r| r.object_name.clone()).collect::<Vec<_>>(),
        columns::RESOURCE_KEY => records.iter().map(|r| r.resource_key().to_string()).collect::<Vec<_>>(),
        columns::LATENCY_MS => records.iter().map(|r| r.latency_ms as f64).collect::<Vec<_>>(),
        columns::FAILED => records.iter().map(|r| r.is_failure()).collect::<Vec<_>>(),
    ]
}
