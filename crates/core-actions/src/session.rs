//! Session loop: read command lines from a host stream, collect change
//! payloads, and dispatch against one editor.
//!
//! Host behavior mirrors a batch stream editor: malformed command lines and
//! changes whose payload does not match the addressed range are reported and
//! skipped, not fatal; blank lines are ignored both between commands and
//! inside payloads. Only I/O failure ends a session early.

use crate::{CommandParser, DispatchError, DispatchResult, ParsedCommand, dispatch};
use core_state::Editor;
use core_text::Line;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::warn;

/// Counters reported when a session ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Commands handed to the dispatcher.
    pub commands: u64,
    /// Command lines that failed to parse and were skipped.
    pub parse_errors: u64,
    /// Changes discarded because the payload size disagreed with the range.
    pub payload_mismatches: u64,
    /// Commands the editor rejected (for example an out-of-range change).
    pub rejected: u64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session stream i/o failed")]
    Io(#[from] io::Error),
}

/// Drive a full session: loop until `q` or end of input, then flush `output`.
pub fn run_session<R: BufRead, W: Write>(
    editor: &mut Editor,
    mut input: R,
    output: &mut W,
) -> Result<SessionSummary, SessionError> {
    let mut summary = SessionSummary::default();
    let mut line = String::new();

    loop {
        let Some(raw) = read_trimmed(&mut input, &mut line)? else {
            break;
        };
        if raw.is_empty() {
            continue;
        }
        let command = match CommandParser::parse(raw) {
            Ok(command) => command,
            Err(err) => {
                summary.parse_errors += 1;
                warn!(target: "actions.session", %err, "command_skipped");
                continue;
            }
        };
        let payload = if let ParsedCommand::Change { start, end } = command {
            let expected = ParsedCommand::range_len(start, end);
            let lines = read_payload(&mut input, &mut line)?;
            if lines.len() != expected {
                summary.payload_mismatches += 1;
                warn!(
                    target: "actions.session",
                    expected,
                    received = lines.len(),
                    "change_payload_mismatch"
                );
                continue;
            }
            lines
        } else {
            Vec::new()
        };

        summary.commands += 1;
        match dispatch(editor, &command, payload, output) {
            Ok(DispatchResult { quit: true }) => break,
            Ok(_) => {}
            Err(DispatchError::Editor(err)) => {
                summary.rejected += 1;
                warn!(target: "actions.session", %err, "command_rejected");
            }
            Err(DispatchError::Io(err)) => return Err(err.into()),
        }
    }

    output.flush()?;
    Ok(summary)
}

/// Next input line without its trailing newline, or `None` at end of input.
fn read_trimmed<'a, R: BufRead>(
    input: &mut R,
    line: &'a mut String,
) -> Result<Option<&'a str>, SessionError> {
    line.clear();
    if input.read_line(line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r'])))
}

/// Collect change payload lines up to the lone `.` terminator. Blank lines
/// do not count toward the payload.
fn read_payload<R: BufRead>(
    input: &mut R,
    line: &mut String,
) -> Result<Vec<Line>, SessionError> {
    let mut lines = Vec::new();
    loop {
        let Some(raw) = read_trimmed(input, line)? else {
            break;
        };
        if raw.is_empty() {
            continue;
        }
        if raw == "." {
            break;
        }
        lines.push(Line::from(raw));
    }
    Ok(lines)
}
