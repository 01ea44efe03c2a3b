//! Typed failures for schema building, size resolution and the row codec.
//!
//! Every variant is a programmer or schema-mismatch error: nothing here is
//! transient and nothing is retried.  Encode failures are raised before any
//! byte of the offending slot reaches the file.

use std::io;
use thiserror::Error;

use crate::compress::CompressError;
use crate::value::Value;

#[derive(Error, Debug)]
pub enum EffiError {
    /// Bad field declaration at schema-build time.
    #[error("Invalid field '{name}': {reason}")]
    InvalidField { name: String, reason: String },

    /// A detection or correction policy was requested; neither is implemented.
    #[error("Field '{field}' requests unsupported feature: {feature}")]
    UnsupportedFeature { field: String, feature: String },

    /// Degenerate or unrepresentable schema.
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Row has {actual} values, schema has {expected} fields")]
    RowShape { expected: usize, actual: usize },

    #[error("Value {value} of field #{field} does not fit in {width} bits")]
    FieldOverflow { field: usize, value: Value, width: u32 },

    /// Decode input length is not a whole number of slots.
    #[error("Truncated record: {len} bytes is not a multiple of the {slot_bytes}-byte slot")]
    TruncatedRecord { len: u64, slot_bytes: usize },

    #[error("Row {index} is out of range, file holds {rows} rows")]
    RowOutOfRange { index: u64, rows: u64 },

    /// A bit run did not fit in the remaining slot buffer.
    #[error("Slot overflow: attempted {attempted} bits, {available} available")]
    SlotOverflow { attempted: usize, available: usize },

    #[error("Cannot parse '{value}' for field '{field}'")]
    Parse { field: String, value: String },

    #[error("Text error: {0}")]
    Text(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Compress(#[from] CompressError),
}

pub type Result<T> = std::result::Result<T, EffiError>;
