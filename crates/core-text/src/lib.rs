//! Line storage primitives: shared-payload lines and the growable row buffer.
//!
//! The buffer holds an ordered sequence of [`Line`]s. Payload bytes are
//! immutable and reference counted, so a line handed to a history snapshot
//! stays valid no matter how often the row array itself reallocates: growth
//! moves handles, never bytes.

use std::collections::TryReserveError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced by [`LineBuffer`] operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// The addressed row does not exist (or a write would leave a gap).
    #[error("row {row} is out of range (buffer has {rows} rows)")]
    OutOfRange { row: usize, rows: usize },
    /// Growing the row array failed; the buffer is unchanged.
    #[error("row storage allocation failed")]
    Allocation(#[source] TryReserveError),
}

/// One logical text line: an opaque, immutable byte payload.
///
/// Cloning a `Line` bumps a reference count; the payload is shared between
/// the buffer and however many history snapshots captured it.
#[derive(Clone, PartialEq, Eq)]
pub struct Line(Arc<[u8]>);

impl Line {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Line {
    fn from(s: &str) -> Self {
        Self(Arc::from(s.as_bytes()))
    }
}

impl From<&[u8]> for Line {
    fn from(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }
}

impl From<Vec<u8>> for Line {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Arc::from(bytes))
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Growable ordered sequence of lines representing the current document.
///
/// Rows are dense: writes may overwrite existing rows or append directly at
/// the end, but never leave a gap. Capacity grows geometrically and is never
/// given back.
#[derive(Debug, Default)]
pub struct LineBuffer {
    rows: Vec<Line>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn with_capacity(rows: usize) -> Self {
        Self {
            rows: Vec::with_capacity(rows),
        }
    }

    /// Number of rows currently in the document.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.rows.capacity()
    }

    /// All rows, in order. Handles only; cloning a slice of this is cheap.
    pub fn rows(&self) -> &[Line] {
        &self.rows
    }

    /// The line at `row`, or `OutOfRange` past the end.
    pub fn get(&self, row: usize) -> Result<&Line, BufferError> {
        self.rows.get(row).ok_or(BufferError::OutOfRange {
            row,
            rows: self.rows.len(),
        })
    }

    /// Overwrite rows starting at `start`, extending the document when the
    /// write runs past the current end. `start` must not exceed the current
    /// row count (no gaps).
    pub fn replace(&mut self, start: usize, lines: &[Line]) -> Result<(), BufferError> {
        if start > self.rows.len() {
            return Err(BufferError::OutOfRange {
                row: start,
                rows: self.rows.len(),
            });
        }
        self.grow(start + lines.len())?;
        let overwritten = (self.rows.len() - start).min(lines.len());
        for (slot, line) in self.rows[start..].iter_mut().zip(lines) {
            *slot = line.clone();
        }
        for line in &lines[overwritten..] {
            self.rows.push(line.clone());
        }
        Ok(())
    }

    /// Remove `count` rows starting at `start`, shifting the tail down while
    /// preserving relative order. Both arguments are clamped to the document.
    pub fn erase(&mut self, start: usize, count: usize) {
        if start >= self.rows.len() || count == 0 {
            return;
        }
        let end = start.saturating_add(count).min(self.rows.len());
        self.rows.drain(start..end);
    }

    /// Re-open a gap at `start` and fill it with `lines`, shifting the tail
    /// up. `start` must not exceed the current row count.
    pub fn insert(&mut self, start: usize, lines: &[Line]) -> Result<(), BufferError> {
        if start > self.rows.len() {
            return Err(BufferError::OutOfRange {
                row: start,
                rows: self.rows.len(),
            });
        }
        self.grow(self.rows.len() + lines.len())?;
        self.rows.splice(start..start, lines.iter().cloned());
        Ok(())
    }

    /// Shrink the document to `rows` rows. No-op when already shorter.
    pub fn truncate(&mut self, rows: usize) {
        self.rows.truncate(rows);
    }

    /// Ensure capacity for at least `min_capacity` rows, doubling past the
    /// minimum so repeated growth stays amortized. Payload bytes are never
    /// touched; only the handle array reallocates.
    pub fn grow(&mut self, min_capacity: usize) -> Result<(), BufferError> {
        if min_capacity <= self.rows.capacity() {
            return Ok(());
        }
        let additional = min_capacity.saturating_mul(2) - self.rows.len();
        self.rows.try_reserve(additional).map_err(BufferError::Allocation)
    }
}
