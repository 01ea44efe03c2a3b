//! Size comparison of an Effi file against the equivalent CSV, raw and
//! after general-purpose compression.
//!
//! The sample table is a people directory: a running `Id` (up to
//! 1,000,000), a constant `Age` of 50 and a 10-digit `PhoneNumber`.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::bits::bits_for_max_decimal;
use crate::codec::Row;
use crate::compress::Compressor;
use crate::error::Result;
use crate::file::{EffiFile, WriterOptions};
use crate::schema::Schema;
use crate::store;
use crate::tabular;
use crate::value::row_of;

pub const DEFAULT_ROWS: u64 = 10_000;

pub const SAMPLE_AGE:   u128 = 50;
pub const SAMPLE_PHONE: u128 = 1_211_211_212;

/// Configuration for [`run`].
#[derive(Debug, Clone)]
pub struct BenchOptions {
    pub rows:        u64,
    /// Directory receiving `sample.effi`, `sample.csv` and compressed copies.
    pub dir:         PathBuf,
    pub compressors: Vec<Compressor>,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            rows:        DEFAULT_ROWS,
            dir:         PathBuf::from("."),
            compressors: Compressor::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompressedSizes {
    pub compressor: &'static str,
    pub effi_bytes: u64,
    pub csv_bytes:  u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BenchReport {
    pub rows:       u64,
    pub slot_bytes: usize,
    pub effi_bytes: u64,
    pub csv_bytes:  u64,
    pub compressed: Vec<CompressedSizes>,
}

/// Id / Age / PhoneNumber, all plain decimals.
pub fn people_schema() -> Result<Schema> {
    Schema::new()
        .add_decimal("Id", bits_for_max_decimal(1_000_000))?
        .add_decimal("Age", bits_for_max_decimal(200))?
        .add_decimal("PhoneNumber", bits_for_max_decimal(9_999_999_999))
}

pub fn sample_row(i: u64) -> Row {
    row_of(&[i as u128, SAMPLE_AGE, SAMPLE_PHONE])
}

pub fn run(opts: &BenchOptions) -> Result<BenchReport> {
    let schema    = people_schema()?;
    let effi_path = opts.dir.join("sample.effi");
    let csv_path  = opts.dir.join("sample.csv");

    let file = EffiFile::new(&effi_path, schema.clone());
    let mut writer = file.writer(WriterOptions { truncate: true, ..Default::default() })?;
    for i in 0..opts.rows {
        writer.write_row(&sample_row(i))?;
    }
    let slot_bytes = writer.layout().slot_bytes();
    writer.finish()?;

    let csv_out = BufWriter::new(File::create(&csv_path)?);
    tabular::write_rows(&schema, csv_out, (0..opts.rows).map(sample_row))?;

    let effi_bytes = store::len(&effi_path)?;
    let csv_bytes  = store::len(&csv_path)?;

    let mut compressed = Vec::with_capacity(opts.compressors.len());
    for &c in &opts.compressors {
        let sizes = CompressedSizes {
            compressor: c.name(),
            effi_bytes: c.compress_file(&effi_path, with_suffix(&effi_path, c.name()))?,
            csv_bytes:  c.compress_file(&csv_path, with_suffix(&csv_path, c.name()))?,
        };
        info!(compressor = sizes.compressor, effi = sizes.effi_bytes, csv = sizes.csv_bytes, "compressed");
        compressed.push(sizes);
    }

    info!(rows = opts.rows, effi = effi_bytes, csv = csv_bytes, "benchmark finished");
    Ok(BenchReport { rows: opts.rows, slot_bytes, effi_bytes, csv_bytes, compressed })
}

fn with_suffix(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
