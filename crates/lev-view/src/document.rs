// SPDX-License-Identifier: MIT
//
// The document: an ordered sequence of rows in on-disk line order.
//
// Loading is byte-oriented — a file full of invalid UTF-8 displays
// just fine, one byte per column. Line terminators (`\n`, `\r\n`) are
// stripped on load; rows never hold a trailing newline.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::row::Row;

/// Failure to load a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The requested file could not be opened or read.
    #[error("cannot open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An ordered sequence of [`Row`]s plus the name shown in the status
/// bar. Rows are append-only; the viewer never mutates text.
#[derive(Debug, Default)]
pub struct Document {
    rows: Vec<Row>,
    path: Option<PathBuf>,
}

impl Document {
    /// An empty, unnamed document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: Vec::new(),
            path: None,
        }
    }

    /// Load a document from a file, line by line.
    ///
    /// # Errors
    ///
    /// [`DocumentError::FileOpen`] with the offending path if the file
    /// cannot be opened or read.
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let wrap = |source| DocumentError::FileOpen {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(wrap)?;
        let mut doc = Self::from_reader(BufReader::new(file)).map_err(wrap)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Read rows from any buffered byte stream. This is the testable
    /// core of [`open`](Self::open).
    ///
    /// # Errors
    ///
    /// Propagates read failures from the underlying stream.
    pub fn from_reader(mut reader: impl BufRead) -> io::Result<Self> {
        let mut doc = Self::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            while line.last() == Some(&b'\n') || line.last() == Some(&b'\r') {
                line.pop();
            }
            doc.push_line(line.clone());
        }
        Ok(doc)
    }

    /// Append one row of raw bytes (no trailing newline).
    pub fn push_line(&mut self, raw: Vec<u8>) {
        self.rows.push(Row::new(raw));
    }

    /// Number of rows. The cursor may also sit at the sentinel index
    /// `num_rows()` — one past the last row.
    #[inline]
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The row at `index`, or `None` on the sentinel row (and beyond).
    #[inline]
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// True if the document holds no rows at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The backing file path, if the document was loaded from one.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
