//! High-level [`EffiFile`] API: a path plus the schema that describes it.
//!
//! ```no_run
//! use effi::file::{EffiFile, WriterOptions};
//! use effi::schema::Schema;
//!
//! let schema = Schema::new().add_decimal("Id", 20)?.add_decimal("Age", 8)?;
//! let file   = EffiFile::new("people.effi", schema);
//!
//! let mut w = file.writer(WriterOptions::default())?;
//! w.write_row(&effi::value::row_of(&[1, 42]))?;
//! w.finish()?;
//!
//! let rows = file.reader()?.read_all()?;
//! assert_eq!(rows, vec![effi::value::row_of(&[1, 42])]);
//! # Ok::<(), effi::EffiError>(())
//! ```
//!
//! The schema is never written to the file.  Every row in a file must be
//! written under the same schema; a reader opened with a different schema
//! decodes garbage without noticing.  Appending to a file whose length is
//! not a whole number of slots is refused, since every later row would be
//! misaligned.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codec::{Row, RowLayout};
use crate::error::{EffiError, Result};
use crate::schema::Schema;
use crate::store::{self, FileStore, DEFAULT_BUFFER_CAPACITY};
use crate::value::Value;

// ── WriterOptions ─────────────────────────────────────────────────────────────

/// Configuration for [`EffiFile::writer`].
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Start from an empty file instead of appending to existing rows.
    pub truncate:        bool,
    pub buffer_capacity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            truncate:        false,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

// ── EffiFile ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EffiFile {
    path:   PathBuf,
    schema: Schema,
}

impl EffiFile {
    pub fn new<P: AsRef<Path>>(path: P, schema: Schema) -> Self {
        Self { path: path.as_ref().to_owned(), schema }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Resolve the row layout for this file's schema.
    pub fn layout(&self) -> Result<RowLayout> {
        RowLayout::new(&self.schema)
    }

    /// Open a writer.  The layout is resolved here, once, and reused for
    /// every row of the session.
    ///
    /// When appending, an existing file must hold a whole number of slots or
    /// this fails with [`EffiError::TruncatedRecord`] before anything is
    /// opened for writing.
    pub fn writer(&self, opts: WriterOptions) -> Result<EffiWriter> {
        let layout = self.layout()?;
        let existing_rows = if opts.truncate {
            0
        } else {
            match store::len(&self.path) {
                Ok(len) => layout.row_count(len)?,
                Err(e) if e.kind() == ErrorKind::NotFound => 0,
                Err(e) => return Err(e.into()),
            }
        };
        let store = if opts.truncate {
            FileStore::create(&self.path, opts.buffer_capacity)?
        } else {
            FileStore::open_append(&self.path, opts.buffer_capacity)?
        };
        debug!(
            path = %self.path.display(),
            slot_bytes = layout.slot_bytes(),
            truncate = opts.truncate,
            existing_rows,
            "opened writer"
        );
        Ok(EffiWriter { layout, store, scratch: Vec::new(), rows_written: 0 })
    }

    pub fn reader(&self) -> Result<EffiReader> {
        let layout = self.layout()?;
        Ok(EffiReader { path: self.path.clone(), layout })
    }
}

// ── Writer ────────────────────────────────────────────────────────────────────

pub struct EffiWriter {
    layout:       RowLayout,
    store:        FileStore,
    scratch:      Vec<u8>,
    rows_written: u64,
}

impl EffiWriter {
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Encode and append one row.  The full slot is built before any I/O, so
    /// an encode error leaves the file untouched.
    pub fn write_row(&mut self, row: &[Value]) -> Result<()> {
        self.scratch.clear();
        self.layout.encode_into(row, &mut self.scratch)?;
        self.store.append(&self.scratch)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Encode every row first, then append them in one go.  Nothing is
    /// written if any row fails to encode.
    pub fn write_rows<I, R>(&mut self, rows: I) -> Result<u64>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[Value]>,
    {
        self.scratch.clear();
        let mut count = 0u64;
        for row in rows {
            self.layout.encode_into(row.as_ref(), &mut self.scratch)?;
            count += 1;
        }
        self.store.append(&self.scratch)?;
        self.rows_written += count;
        Ok(count)
    }

    /// Empty the file and keep writing from its start.
    pub fn delete_contents(&mut self) -> Result<()> {
        self.store.truncate()?;
        self.rows_written = 0;
        Ok(())
    }

    /// Flush buffered slots and close the handle.
    pub fn finish(mut self) -> Result<u64> {
        self.store.flush()?;
        debug!(
            rows = self.rows_written,
            bytes = self.store.bytes_written(),
            path = %self.store.path().display(),
            "writer finished"
        );
        Ok(self.rows_written)
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

pub struct EffiReader {
    path:   PathBuf,
    layout: RowLayout,
}

impl EffiReader {
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// File size divided by slot size.
    pub fn row_count(&self) -> Result<u64> {
        self.layout.row_count(store::len(&self.path)?)
    }

    pub fn read_all(&self) -> Result<Vec<Row>> {
        self.layout.decode(&store::read_all(&self.path)?)
    }

    /// Stream rows one slot at a time.
    ///
    /// The file length is checked up front, so a trailing partial slot fails
    /// before the first row is yielded.
    pub fn rows(&self) -> Result<RowIter> {
        let file = File::open(&self.path)?;
        let len  = file.metadata()?.len();
        let remaining = self.layout.row_count(len)?;
        Ok(RowIter {
            reader: BufReader::new(file),
            layout: self.layout.clone(),
            slot:   vec![0u8; self.layout.slot_bytes()],
            remaining,
        })
    }

    /// Read row `index` by seeking to `index * slot_bytes`.
    pub fn read_row(&self, index: u64) -> Result<Row> {
        let rows = self.row_count()?;
        if index >= rows {
            return Err(EffiError::RowOutOfRange { index, rows });
        }
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.layout.offset_of(index)))?;
        let mut slot = vec![0u8; self.layout.slot_bytes()];
        file.read_exact(&mut slot)?;
        self.layout.decode_slot(&slot)
    }
}

pub struct RowIter {
    reader:    BufReader<File>,
    layout:    RowLayout,
    slot:      Vec<u8>,
    remaining: u64,
}

impl Iterator for RowIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if let Err(e) = self.reader.read_exact(&mut self.slot) {
            self.remaining = 0;
            return Some(Err(e.into()));
        }
        Some(self.layout.decode_slot(&self.slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::row_of;
    use tempfile::tempdir;

    fn schema() -> Schema {
        Schema::new()
            .add_decimal("Id", 20).unwrap()
            .add_decimal("Age", 8).unwrap()
            .add_text("Code", 2).unwrap()
    }

    #[test]
    fn test_write_then_stream() {
        let dir  = tempdir().unwrap();
        let file = EffiFile::new(dir.path().join("t.effi"), schema());

        let mut w = file.writer(WriterOptions { truncate: true, ..Default::default() }).unwrap();
        for i in 0..5u128 {
            w.write_row(&row_of(&[i, 30 + i, 0x41])).unwrap();
        }
        assert_eq!(w.finish().unwrap(), 5);

        let r = file.reader().unwrap();
        assert_eq!(r.row_count().unwrap(), 5);
        let streamed: Vec<Row> = r.rows().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(streamed, r.read_all().unwrap());
        assert_eq!(r.read_row(3).unwrap(), row_of(&[3, 33, 0x41]));
        assert!(matches!(r.read_row(5), Err(EffiError::RowOutOfRange { index: 5, rows: 5 })));
        assert!(matches!(r.read_row(u64::MAX), Err(EffiError::RowOutOfRange { rows: 5, .. })));
    }

    #[test]
    fn test_write_rows_is_all_or_nothing() {
        let dir  = tempdir().unwrap();
        let file = EffiFile::new(dir.path().join("t.effi"), schema());

        let mut w = file.writer(WriterOptions::default()).unwrap();
        let rows: Vec<Row> = vec![row_of(&[1, 2, 3]), row_of(&[4, 1 << 8, 6])];
        assert!(matches!(w.write_rows(&rows), Err(EffiError::FieldOverflow { field: 1, .. })));
        assert_eq!(w.write_rows(&rows[..1]).unwrap(), 1);
        w.finish().unwrap();

        assert_eq!(file.reader().unwrap().read_all().unwrap(), vec![row_of(&[1, 2, 3])]);
    }

    #[test]
    fn test_delete_contents_and_append() {
        let dir  = tempdir().unwrap();
        let file = EffiFile::new(dir.path().join("t.effi"), schema());

        let mut w = file.writer(WriterOptions::default()).unwrap();
        w.write_row(&row_of(&[1, 1, 1])).unwrap();
        w.delete_contents().unwrap();
        w.write_row(&row_of(&[2, 2, 2])).unwrap();
        w.finish().unwrap();

        let mut w = file.writer(WriterOptions::default()).unwrap();
        w.write_row(&row_of(&[3, 3, 3])).unwrap();
        w.finish().unwrap();

        let rows = file.reader().unwrap().read_all().unwrap();
        assert_eq!(rows, vec![row_of(&[2, 2, 2]), row_of(&[3, 3, 3])]);
    }

    #[test]
    fn test_partial_slot_detected() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("t.effi");
        std::fs::write(&path, [0u8; 9]).unwrap();

        let r = EffiFile::new(&path, schema()).reader().unwrap();
        assert!(matches!(r.row_count(), Err(EffiError::TruncatedRecord { len: 9, slot_bytes: 8 })));
        assert!(r.rows().is_err());
        assert!(r.read_all().is_err());
    }

    #[test]
    fn test_append_to_misaligned_file_refused() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("t.effi");
        std::fs::write(&path, [0u8; 9]).unwrap();

        let file = EffiFile::new(&path, schema());
        assert!(matches!(
            file.writer(WriterOptions::default()),
            Err(EffiError::TruncatedRecord { len: 9, slot_bytes: 8 })
        ));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 9);

        // Truncating is still allowed and starts clean.
        let mut w = file.writer(WriterOptions { truncate: true, ..Default::default() }).unwrap();
        w.write_row(&row_of(&[1, 2, 3])).unwrap();
        w.finish().unwrap();
        assert_eq!(file.reader().unwrap().row_count().unwrap(), 1);
    }

    #[test]
    fn test_append_to_missing_file_creates_it() {
        let dir  = tempdir().unwrap();
        let file = EffiFile::new(dir.path().join("new.effi"), schema());
        let mut w = file.writer(WriterOptions::default()).unwrap();
        w.write_row(&row_of(&[9, 9, 9])).unwrap();
        w.finish().unwrap();
        assert_eq!(file.reader().unwrap().read_all().unwrap(), vec![row_of(&[9, 9, 9])]);
    }
}
