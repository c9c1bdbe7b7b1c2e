//! Edit history: the append-only record log with branch truncation and the
//! snapshot states that make lazy materialization explicit.
//!
//! The log keeps one [`EditRecord`] per completed change/delete and a cursor
//! over how many of them are currently applied to the document. Appending
//! while part of the log is un-applied discards the redo-reachable future
//! before the new record lands. Stepping back over the pristine boundary is
//! not an error; the caller sees `None` and stops.

use core_text::Line;
use std::collections::TryReserveError;
use tracing::trace;

/// What kind of edit a record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Change,
    Delete,
}

/// A captured span of lines, with the "not captured yet" and "nothing to
/// capture" cases kept distinct.
///
/// `Unmaterialized` only ever appears on the redo side of a Change record:
/// the replacement payload is recovered from the buffer on the first undo of
/// that record and cached from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Unmaterialized,
    Captured(Vec<Line>),
    Empty,
}

impl Snapshot {
    pub fn is_unmaterialized(&self) -> bool {
        matches!(self, Snapshot::Unmaterialized)
    }
}

/// One history entry.
///
/// `before` holds the lines the edit displaced (restored on undo) and is
/// captured when the record is created (handle copies, no byte copies).
/// `after` holds the lines the edit wrote (replayed on redo); for a Change it
/// starts `Unmaterialized` and is filled in on first undo, for a Delete it is
/// always `Empty` because redo just erases again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub kind: EditKind,
    /// First row the edit touched.
    pub line_start: usize,
    /// Rows written (Change) or removed (Delete), already clamped.
    pub line_count: usize,
    /// Document row count immediately before the edit.
    pub rows_before: usize,
    pub before: Snapshot,
    pub after: Snapshot,
}

/// Append-only record log plus the applied-prefix cursor.
///
/// `applied` counts how many records are currently reflected in the document;
/// `0` is the pristine state. Invariant: `applied <= records.len()`.
#[derive(Debug, Default)]
pub struct HistoryLog {
    records: Vec<EditRecord>,
    applied: usize,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(records: usize) -> Self {
        Self {
            records: Vec::with_capacity(records),
            applied: 0,
        }
    }

    /// Total records, applied or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records currently applied to the document (the undoable count).
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Records ahead of the cursor (the redoable count).
    pub fn redoable(&self) -> usize {
        self.records.len() - self.applied
    }

    /// Make room for one more record, doubling capacity past the need so
    /// growth stays amortized. Fails without touching the log.
    pub fn reserve_record(&mut self) -> Result<(), TryReserveError> {
        let needed = self.records.len() + 1;
        if needed <= self.records.capacity() {
            return Ok(());
        }
        let additional = needed.saturating_mul(2) - self.records.len();
        self.records.try_reserve(additional)
    }

    /// Append a record at the cursor, discarding any redo-reachable future.
    pub fn append(&mut self, record: EditRecord) -> Result<(), TryReserveError> {
        self.reserve_record()?;
        let discarded = self.records.len() - self.applied;
        if discarded > 0 {
            self.records.truncate(self.applied);
        }
        trace!(
            target: "state.history",
            kind = ?record.kind,
            line_start = record.line_start,
            line_count = record.line_count,
            rows_before = record.rows_before,
            discarded,
            applied = self.applied + 1,
            "append"
        );
        self.records.push(record);
        self.applied += 1;
        Ok(())
    }

    /// Step the cursor back over the most recently applied record and return
    /// a copy of it (handle copies only). `None` at the pristine state; the
    /// cursor does not move further.
    pub fn step_back(&mut self) -> Option<EditRecord> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;
        Some(self.records[self.applied].clone())
    }

    /// Step the cursor forward over the next un-applied record and return a
    /// copy of it. `None` when the log is exhausted.
    pub fn step_forward(&mut self) -> Option<EditRecord> {
        if self.applied == self.records.len() {
            return None;
        }
        let record = self.records[self.applied].clone();
        self.applied += 1;
        Some(record)
    }

    /// Overwrite the record just stepped back over with a copy carrying its
    /// freshly materialized redo payload, so later undo/redo of the same
    /// record skips recomputation.
    pub fn store_materialized(&mut self, record: &EditRecord) {
        debug_assert!(self.applied < self.records.len());
        trace!(
            target: "state.history",
            line_start = record.line_start,
            line_count = record.line_count,
            "snapshot_materialized"
        );
        self.records[self.applied] = record.clone();
    }
}
