//! Editor state: the line buffer paired with its edit history and the
//! deferred undo/redo replay that sits between them.
//!
//! Undo and redo requests are cheap: they only adjust a signed pending step
//! count, clamped so the history cursor can never leave its valid range. The
//! real replay happens on [`Editor::flush`], which every other operation
//! calls first, so a run of `u`/`r` requests costs exactly the net number of
//! cursor steps when the next change, delete, or read arrives, no matter how
//! long the run was.
//!
//! Replay is a per-step state machine over [`history::EditRecord`]s. The
//! first undo of a Change recovers the replacement payload from the buffer
//! (it is about to be overwritten by the restored lines) and caches it in the
//! record, so every later pass over the same record reuses the cached lines.

use core_text::{BufferError, Line, LineBuffer};
use std::collections::TryReserveError;
use thiserror::Error;
use tracing::trace;

pub mod history;

use history::{EditKind, EditRecord, HistoryLog, Snapshot};

/// Marker substituted for rows past the end of the document when reading.
pub const EMPTY_LINE_MARKER: &[u8] = b".";

/// Errors surfaced by [`Editor`] operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A change addressed a start row past the end of the document. Nothing
    /// was mutated.
    #[error("change start {line} is past the end of the buffer ({rows} rows)")]
    OutOfRange { line: usize, rows: usize },
    /// Backing-array growth failed before the request mutated anything.
    #[error("history or buffer storage allocation failed")]
    Allocation(#[source] TryReserveError),
}

impl From<BufferError> for EditorError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::OutOfRange { row, rows } => EditorError::OutOfRange { line: row, rows },
            BufferError::Allocation(e) => EditorError::Allocation(e),
        }
    }
}

/// In-memory line editor: document buffer, history log, and the pending
/// undo/redo delta. Single exclusive handle; callers serialize access.
#[derive(Debug, Default)]
pub struct Editor {
    buffer: LineBuffer,
    history: HistoryLog,
    /// Net pending steps: negative = undo, positive = redo. Always clamped so
    /// `applied + pending` stays within `[0, history.len()]`.
    pending: isize,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rows: usize, records: usize) -> Self {
        Self {
            buffer: LineBuffer::with_capacity(rows),
            history: HistoryLog::with_capacity(records),
            pending: 0,
        }
    }

    /// Rows in the document as of the last flush. Pending undo/redo is not
    /// reflected until a mutating or reading operation forces it.
    pub fn row_count(&self) -> usize {
        self.buffer.row_count()
    }

    /// Edits that an immediate flush could undo.
    pub fn undo_depth(&self) -> usize {
        self.history.applied()
    }

    /// Edits that an immediate flush could redo.
    pub fn redo_depth(&self) -> usize {
        self.history.redoable()
    }

    /// Net un-replayed undo(-)/redo(+) steps.
    pub fn pending_steps(&self) -> isize {
        self.pending
    }

    /// Replace `lines.len()` rows starting at `line_start`, extending the
    /// document when the write runs past the end. Fails with `OutOfRange`
    /// when `line_start` would leave a gap; the pending delta is flushed
    /// first either way.
    pub fn apply_change(&mut self, line_start: usize, lines: Vec<Line>) -> Result<(), EditorError> {
        self.flush()?;
        let rows = self.buffer.row_count();
        if line_start > rows {
            return Err(EditorError::OutOfRange {
                line: line_start,
                rows,
            });
        }
        // Front-load both growths so a failed request leaves no trace.
        self.buffer.grow(line_start + lines.len())?;
        self.history.reserve_record().map_err(EditorError::Allocation)?;

        let overwritten = lines.len().min(rows - line_start);
        let record = EditRecord {
            kind: EditKind::Change,
            line_start,
            line_count: lines.len(),
            rows_before: rows,
            before: self.capture(line_start, overwritten),
            after: Snapshot::Unmaterialized,
        };
        self.buffer.replace(line_start, &lines)?;
        self.history.append(record).map_err(EditorError::Allocation)?;
        Ok(())
    }

    /// Delete up to `line_count` rows starting at `line_start`, clamped to
    /// the rows that exist. Deleting from an empty document mutates nothing
    /// but is still recorded, so undo/redo walk over it consistently.
    pub fn apply_delete(&mut self, line_start: usize, line_count: usize) -> Result<(), EditorError> {
        self.flush()?;
        self.history.reserve_record().map_err(EditorError::Allocation)?;
        let rows = self.buffer.row_count();
        let count = line_count.min(rows.saturating_sub(line_start));
        let record = EditRecord {
            kind: EditKind::Delete,
            line_start,
            line_count: count,
            rows_before: rows,
            before: self.capture(line_start, count),
            after: Snapshot::Empty,
        };
        self.buffer.erase(line_start, count);
        self.history.append(record).map_err(EditorError::Allocation)?;
        Ok(())
    }

    /// Queue `steps` undo steps. Never replays; excess past the pristine
    /// state is clamped and silently discarded.
    pub fn request_undo(&mut self, steps: usize) {
        let applied = self.history.applied() as isize;
        let target = applied + self.pending - steps as isize;
        if target >= 0 {
            self.pending -= steps as isize;
        } else {
            self.pending = -applied;
        }
        trace!(target: "state.undo", requested = steps, pending = self.pending, "undo_requested");
    }

    /// Queue `steps` redo steps. Never replays; excess past the history tail
    /// is clamped and silently discarded.
    pub fn request_redo(&mut self, steps: usize) {
        let applied = self.history.applied() as isize;
        let target = applied + self.pending + steps as isize;
        if target <= self.history.len() as isize {
            self.pending += steps as isize;
        } else {
            self.pending = self.history.len() as isize - applied;
        }
        trace!(target: "state.undo", requested = steps, pending = self.pending, "redo_requested");
    }

    /// Replay the pending delta against the buffer and reset it. Called
    /// automatically by every change, delete, and read.
    pub fn flush(&mut self) -> Result<(), EditorError> {
        let pending = std::mem::take(&mut self.pending);
        if pending == 0 {
            return Ok(());
        }
        trace!(
            target: "state.undo",
            pending,
            applied = self.history.applied(),
            "flush_replay"
        );
        if pending > 0 {
            self.replay_redo(pending as usize)
        } else {
            self.replay_undo(pending.unsigned_abs())
        }
    }

    /// Lazily read `line_count` rows starting at `line_start`. Rows past the
    /// end yield [`EMPTY_LINE_MARKER`]. The iterator is restartable (clone
    /// it) and borrows the document, so the pending delta is flushed here.
    pub fn read_range(
        &mut self,
        line_start: usize,
        line_count: usize,
    ) -> Result<ReadRange<'_>, EditorError> {
        self.flush()?;
        Ok(ReadRange {
            buffer: &self.buffer,
            next: line_start,
            end: line_start.saturating_add(line_count),
        })
    }

    /// Copy out the row handles in `[start, start + count)`, clamped to the
    /// document. `Empty` when there is nothing in range.
    fn capture(&self, start: usize, count: usize) -> Snapshot {
        let end = start.saturating_add(count).min(self.buffer.row_count());
        if start >= end {
            return Snapshot::Empty;
        }
        Snapshot::Captured(self.buffer.rows()[start..end].to_vec())
    }

    fn replay_undo(&mut self, steps: usize) -> Result<(), EditorError> {
        for _ in 0..steps {
            // Exhausted history ends the loop early; it is not an error.
            let Some(mut record) = self.history.step_back() else {
                break;
            };
            match record.kind {
                EditKind::Change => {
                    if record.after.is_unmaterialized() {
                        // First undo of this change: the buffer still holds
                        // the replacement payload. Capture it for redo before
                        // the restore below overwrites it.
                        record.after = self.capture(record.line_start, record.line_count);
                        self.history.store_materialized(&record);
                    }
                    if let Snapshot::Captured(old) = &record.before {
                        self.buffer.replace(record.line_start, old)?;
                    }
                    self.buffer.truncate(record.rows_before);
                }
                EditKind::Delete => {
                    if let Snapshot::Captured(old) = &record.before {
                        self.buffer.insert(record.line_start, old)?;
                    }
                    self.buffer.truncate(record.rows_before);
                }
            }
            trace!(
                target: "state.undo",
                kind = ?record.kind,
                line_start = record.line_start,
                rows = self.buffer.row_count(),
                "undo_step"
            );
        }
        Ok(())
    }

    fn replay_redo(&mut self, steps: usize) -> Result<(), EditorError> {
        for _ in 0..steps {
            let Some(record) = self.history.step_forward() else {
                break;
            };
            match record.kind {
                EditKind::Change => {
                    // Materialized on the undo that made this redo possible.
                    if let Snapshot::Captured(new) = &record.after {
                        self.buffer.replace(record.line_start, new)?;
                    }
                }
                EditKind::Delete => {
                    if self.buffer.row_count() > 0 {
                        self.buffer.erase(record.line_start, record.line_count);
                    }
                }
            }
            trace!(
                target: "state.undo",
                kind = ?record.kind,
                line_start = record.line_start,
                rows = self.buffer.row_count(),
                "redo_step"
            );
        }
        Ok(())
    }
}

/// Lazy view over a requested row range; see [`Editor::read_range`].
#[derive(Debug, Clone)]
pub struct ReadRange<'a> {
    buffer: &'a LineBuffer,
    next: usize,
    end: usize,
}

impl<'a> Iterator for ReadRange<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let row = self.next;
        self.next += 1;
        Some(
            self.buffer
                .get(row)
                .map(Line::as_bytes)
                .unwrap_or(EMPTY_LINE_MARKER),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ReadRange<'_> {}
