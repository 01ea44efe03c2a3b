//! Sequential byte channel over a single file.
//!
//! Append-only for writers, read-everything for readers.  There is no index
//! and no random access here; rows are fixed-size, so callers that need a
//! particular row compute its offset themselves.
//!
//! A [`FileStore`] keeps one buffered handle open for its whole session and
//! closes it on drop, on every exit path.  Call [`FileStore::flush`] (or
//! [`EffiWriter::finish`](crate::file::EffiWriter::finish)) to surface write
//! errors that a drop would swallow.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

/// Default write buffer: 64 KiB.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

pub struct FileStore {
    path:    PathBuf,
    writer:  BufWriter<File>,
    written: u64,
}

impl FileStore {
    /// Truncate `path` (or create it empty) and open it for appending.
    pub fn create<P: AsRef<Path>>(path: P, buffer_capacity: usize) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        truncate_or_create_empty(&path)?;
        Self::open_append(path, buffer_capacity)
    }

    /// Open `path` for appending, creating it if missing.
    pub fn open_append<P: AsRef<Path>>(path: P, buffer_capacity: usize) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), len = file.metadata()?.len(), "opened store for append");
        Ok(Self {
            path,
            writer:  BufWriter::with_capacity(buffer_capacity.max(1), file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended through this handle.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.written += bytes.len() as u64;
        trace!(len = bytes.len(), total = self.written, "appended");
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Drop everything written so far, through this handle or before it.
    pub fn truncate(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().set_len(0)?;
        self.written = 0;
        debug!(path = %self.path.display(), "truncated store");
        Ok(())
    }
}

/// Truncate `path` to zero bytes, creating it if it does not exist.
pub fn truncate_or_create_empty<P: AsRef<Path>>(path: P) -> io::Result<()> {
    File::create(path.as_ref())?;
    Ok(())
}

pub fn read_all<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    fs::read(path)
}

/// Current size of the file at `path`.
pub fn len<P: AsRef<Path>>(path: P) -> io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_read_all() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("data.effi");

        let mut store = FileStore::create(&path, 4).unwrap();
        store.append(&[1, 2, 3]).unwrap();
        store.append(&[4, 5, 6, 7, 8]).unwrap();
        store.flush().unwrap();

        assert_eq!(store.bytes_written(), 8);
        assert_eq!(read_all(&path).unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(len(&path).unwrap(), 8);
    }

    #[test]
    fn test_open_append_keeps_existing() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("data.effi");
        fs::write(&path, [9, 9]).unwrap();

        {
            let mut store = FileStore::open_append(&path, DEFAULT_BUFFER_CAPACITY).unwrap();
            store.append(&[1]).unwrap();
        }
        assert_eq!(read_all(&path).unwrap(), vec![9, 9, 1]);
    }

    #[test]
    fn test_create_and_truncate() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("data.effi");
        fs::write(&path, [1, 2, 3]).unwrap();

        let mut store = FileStore::create(&path, DEFAULT_BUFFER_CAPACITY).unwrap();
        assert_eq!(len(&path).unwrap(), 0);

        store.append(&[7, 7]).unwrap();
        store.truncate().unwrap();
        store.append(&[8]).unwrap();
        store.flush().unwrap();
        assert_eq!(read_all(&path).unwrap(), vec![8]);
    }
}
