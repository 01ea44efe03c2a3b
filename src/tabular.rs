//! CSV <-> row conversion, schema-aware.
//!
//! Decimal cells are unsigned integers of any length; text cells are 7-bit
//! strings packed with [`text::pack`](crate::text::pack).  Records have no
//! header line and one cell per schema field, in schema order.

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::codec::Row;
use crate::error::{EffiError, Result};
use crate::schema::{DataKind, Schema};
use crate::text;
use crate::value::Value;

/// Convert one CSV record to a row.
pub fn parse_record(schema: &Schema, record: &StringRecord) -> Result<Row> {
    if record.len() != schema.len() {
        return Err(EffiError::RowShape { expected: schema.len(), actual: record.len() });
    }
    schema
        .fields()
        .iter()
        .zip(record.iter())
        .map(|(field, cell)| match field.kind {
            DataKind::Decimal => cell.trim().parse::<Value>().map_err(|_| EffiError::Parse {
                field: field.name.clone(),
                value: cell.to_owned(),
            }),
            DataKind::Text => text::pack(cell, field.declared_width),
        })
        .collect()
}

/// Convert one row to CSV cells.
pub fn format_row(schema: &Schema, row: &[Value]) -> Result<Vec<String>> {
    if row.len() != schema.len() {
        return Err(EffiError::RowShape { expected: schema.len(), actual: row.len() });
    }
    schema
        .fields()
        .iter()
        .zip(row)
        .map(|(field, value)| match field.kind {
            DataKind::Decimal => Ok(value.to_string()),
            DataKind::Text    => text::unpack(value, field.declared_width),
        })
        .collect()
}

pub fn read_rows<R: Read>(schema: &Schema, input: R) -> Result<Vec<Row>> {
    let mut rdr = ReaderBuilder::new().has_headers(false).from_reader(input);
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(parse_record(schema, &record?)?);
    }
    Ok(rows)
}

pub fn write_rows<W, I, R>(schema: &Schema, output: W, rows: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = R>,
    R: AsRef<[Value]>,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(output);
    for row in rows {
        wtr.write_record(format_row(schema, row.as_ref())?)?;
    }
    wtr.flush()?;
    Ok(())
}
