//! General-purpose compressors used to benchmark Effi files against CSV.
//!
//! These never touch the row format: they consume a finished file as an
//! opaque blob and report how small it gets.  `Gzip` and `Xz` are the
//! baselines the format is usually compared against; `Xz` writes a real
//! `.xz` container, `Lzma` the bare LZMA stream.

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Compression error: {0}")]
    Compression(String),
    #[error("Decompression error: {0}")]
    Decompression(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Compressor ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressor {
    Gzip,
    Xz,
    Zstd,
    Lz4,
    Brotli,
    Lzma,
}

pub const DEFAULT_GZIP_LEVEL:     u32 = 6;
pub const DEFAULT_ZSTD_LEVEL:     i32 = 3;
pub const DEFAULT_BROTLI_QUALITY: u32 = 9;

impl Compressor {
    pub const ALL: [Compressor; 6] = [
        Compressor::Gzip,
        Compressor::Xz,
        Compressor::Zstd,
        Compressor::Lz4,
        Compressor::Brotli,
        Compressor::Lzma,
    ];

    /// Human-readable name, also the file extension used by the benchmark.
    pub fn name(self) -> &'static str {
        match self {
            Compressor::Gzip   => "gzip",
            Compressor::Xz     => "xz",
            Compressor::Zstd   => "zstd",
            Compressor::Lz4    => "lz4",
            Compressor::Brotli => "brotli",
            Compressor::Lzma   => "lzma",
        }
    }

    /// Parse from a CLI string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gzip" | "gz"   => Some(Compressor::Gzip),
            "xz"            => Some(Compressor::Xz),
            "zstd"          => Some(Compressor::Zstd),
            "lz4"           => Some(Compressor::Lz4),
            "brotli"        => Some(Compressor::Brotli),
            "lzma"          => Some(Compressor::Lzma),
            _               => None,
        }
    }

    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        match self {
            Compressor::Gzip => {
                let mut w = GzEncoder::new(Vec::new(), Compression::new(DEFAULT_GZIP_LEVEL));
                w.write_all(data).map_err(|e| CompressError::Compression(e.to_string()))?;
                w.finish().map_err(|e| CompressError::Compression(e.to_string()))
            }
            Compressor::Xz => {
                let mut out = Vec::new();
                lzma_rs::xz_compress(&mut Cursor::new(data), &mut out)
                    .map_err(|e| CompressError::Compression(e.to_string()))?;
                Ok(out)
            }
            Compressor::Zstd => zstd::encode_all(data, DEFAULT_ZSTD_LEVEL)
                .map_err(|e| CompressError::Compression(e.to_string())),
            Compressor::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            Compressor::Brotli => {
                let mut out = Vec::new();
                {
                    let mut w = brotli::CompressorWriter::new(&mut out, 4096, DEFAULT_BROTLI_QUALITY, 22);
                    w.write_all(data).map_err(|e| CompressError::Compression(e.to_string()))?;
                }
                Ok(out)
            }
            Compressor::Lzma => {
                let mut out = Vec::new();
                lzma_rs::lzma_compress(&mut Cursor::new(data), &mut out)
                    .map_err(|e| CompressError::Compression(e.to_string()))?;
                Ok(out)
            }
        }
    }

    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>, CompressError> {
        match self {
            Compressor::Gzip => {
                let mut out = Vec::new();
                GzDecoder::new(data)
                    .read_to_end(&mut out)
                    .map_err(|e| CompressError::Decompression(e.to_string()))?;
                Ok(out)
            }
            Compressor::Xz => {
                let mut out = Vec::new();
                lzma_rs::xz_decompress(&mut Cursor::new(data), &mut out)
                    .map_err(|e| CompressError::Decompression(e.to_string()))?;
                Ok(out)
            }
            Compressor::Zstd => zstd::decode_all(data)
                .map_err(|e| CompressError::Decompression(e.to_string())),
            Compressor::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| CompressError::Decompression(e.to_string())),
            Compressor::Brotli => {
                let mut out = Vec::new();
                brotli::Decompressor::new(data, 4096)
                    .read_to_end(&mut out)
                    .map_err(|e| CompressError::Decompression(e.to_string()))?;
                Ok(out)
            }
            Compressor::Lzma => {
                let mut out = Vec::new();
                lzma_rs::lzma_decompress(&mut Cursor::new(data), &mut out)
                    .map_err(|e| CompressError::Decompression(e.to_string()))?;
                Ok(out)
            }
        }
    }

    /// Compress the file at `input` into `output`; returns the compressed size.
    pub fn compress_file<P: AsRef<Path>, Q: AsRef<Path>>(
        self,
        input:  P,
        output: Q,
    ) -> Result<u64, CompressError> {
        let mut data = Vec::new();
        BufReader::new(File::open(input)?).read_to_end(&mut data)?;
        let packed = self.compress(&data)?;
        File::create(output)?.write_all(&packed)?;
        Ok(packed.len() as u64)
    }
}
