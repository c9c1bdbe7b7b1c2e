//! Command-line protocol for the editor core: parsing raw command lines and
//! dispatching the resulting commands against an [`Editor`].
//!
//! The protocol is one command per line. Ranged commands carry a 1-indexed
//! inclusive address pair (`<a>,<b>c`, `<a>,<b>d`, `<a>,<b>p`); undo/redo
//! carry a step count (`<n>u`, `<n>r`); `q` quits. A change is followed by
//! its replacement lines and a lone `.` terminator.
//!
//! Parsing is pure classification; no side effects here. Session plumbing
//! (reading payloads, skipping malformed input) lives in [`session`].

use core_state::{Editor, EditorError};
use core_text::Line;
use std::io::{self, Write};
use thiserror::Error;
use tracing::trace;

pub mod session;

pub use session::{SessionSummary, run_session};

/// A structurally valid command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCommand {
    /// Replace the addressed range with the payload that follows.
    Change { start: usize, end: usize },
    /// Delete the addressed range.
    Delete { start: usize, end: usize },
    /// Print the addressed range.
    Print { start: usize, end: usize },
    Undo(usize),
    Redo(usize),
    Quit,
}

impl ParsedCommand {
    /// Rows an inclusive 1-indexed `start..=end` range covers, treating a
    /// reversed or zero-anchored range as empty.
    pub(crate) fn range_len(start: usize, end: usize) -> usize {
        (end + 1).saturating_sub(start.max(1))
    }
}

/// Errors from classifying a raw command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command line")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(char),
    #[error("malformed command parameters `{0}`")]
    Parameters(String),
}

pub struct CommandParser;

impl CommandParser {
    pub fn parse(raw: &str) -> Result<ParsedCommand, ParseError> {
        let s = raw.trim();
        let Some(op) = s.chars().last() else {
            return Err(ParseError::Empty);
        };
        let body = &s[..s.len() - op.len_utf8()];
        match op {
            'c' => Self::parse_range(body).map(|(start, end)| ParsedCommand::Change { start, end }),
            'd' => Self::parse_range(body).map(|(start, end)| ParsedCommand::Delete { start, end }),
            'p' => Self::parse_range(body).map(|(start, end)| ParsedCommand::Print { start, end }),
            'u' => Self::parse_count(body).map(ParsedCommand::Undo),
            'r' => Self::parse_count(body).map(ParsedCommand::Redo),
            'q' if body.is_empty() => Ok(ParsedCommand::Quit),
            other => Err(ParseError::UnknownCommand(other)),
        }
    }

    fn parse_range(body: &str) -> Result<(usize, usize), ParseError> {
        let malformed = || ParseError::Parameters(body.to_string());
        let (first, second) = body.split_once(',').ok_or_else(malformed)?;
        let start = first.trim().parse().map_err(|_| malformed())?;
        let end = second.trim().parse().map_err(|_| malformed())?;
        Ok((start, end))
    }

    fn parse_count(body: &str) -> Result<usize, ParseError> {
        body.trim()
            .parse()
            .map_err(|_| ParseError::Parameters(body.to_string()))
    }
}

/// Result of dispatching a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    pub quit: bool,
}

impl DispatchResult {
    pub fn proceed() -> Self {
        Self { quit: false }
    }
    pub fn quit() -> Self {
        Self { quit: true }
    }
}

/// Errors from executing a dispatched command.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("editor rejected the command")]
    Editor(#[from] EditorError),
    #[error("writing to the output stream failed")]
    Io(#[from] io::Error),
}

/// Execute one parsed command against the editor. `payload` carries the
/// replacement lines for a change and is empty for everything else. Print
/// output goes to `out`, one line per addressed row, with the empty-line
/// marker for rows past the end.
pub fn dispatch<W: Write>(
    editor: &mut Editor,
    command: &ParsedCommand,
    payload: Vec<Line>,
    out: &mut W,
) -> Result<DispatchResult, DispatchError> {
    match *command {
        ParsedCommand::Change { start, .. } => {
            let line_start = start.max(1) - 1;
            trace!(target: "actions.dispatch", op = "change", line_start, lines = payload.len(), "dispatch");
            editor.apply_change(line_start, payload)?;
        }
        ParsedCommand::Delete { start, end } => {
            let line_start = start.max(1) - 1;
            let count = ParsedCommand::range_len(start, end);
            trace!(target: "actions.dispatch", op = "delete", line_start, count, "dispatch");
            editor.apply_delete(line_start, count)?;
        }
        ParsedCommand::Print { start, end } => {
            // Address 0 has no row behind it; the whole print collapses to a
            // single empty-line marker.
            if start == 0 || end == 0 {
                out.write_all(core_state::EMPTY_LINE_MARKER)?;
                out.write_all(b"\n")?;
                return Ok(DispatchResult::proceed());
            }
            let count = ParsedCommand::range_len(start, end);
            for bytes in editor.read_range(start - 1, count)? {
                out.write_all(bytes)?;
                out.write_all(b"\n")?;
            }
        }
        ParsedCommand::Undo(steps) => editor.request_undo(steps),
        ParsedCommand::Redo(steps) => editor.request_redo(steps),
        ParsedCommand::Quit => return Ok(DispatchResult::quit()),
    }
    Ok(DispatchResult::proceed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_change() {
        assert_eq!(
            CommandParser::parse("1,2c"),
            Ok(ParsedCommand::Change { start: 1, end: 2 })
        );
    }

    #[test]
    fn parse_delete_and_print() {
        assert_eq!(
            CommandParser::parse("4,6d"),
            Ok(ParsedCommand::Delete { start: 4, end: 6 })
        );
        assert_eq!(
            CommandParser::parse("1,1p"),
            Ok(ParsedCommand::Print { start: 1, end: 1 })
        );
    }

    #[test]
    fn parse_undo_redo() {
        assert_eq!(CommandParser::parse("10u"), Ok(ParsedCommand::Undo(10)));
        assert_eq!(CommandParser::parse("3r"), Ok(ParsedCommand::Redo(3)));
    }

    #[test]
    fn parse_quit() {
        assert_eq!(CommandParser::parse("q"), Ok(ParsedCommand::Quit));
    }

    #[test]
    fn parse_rejects_unknown_command() {
        assert_eq!(
            CommandParser::parse("1,2z"),
            Err(ParseError::UnknownCommand('z'))
        );
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert_eq!(
            CommandParser::parse("12c"),
            Err(ParseError::Parameters("12".into()))
        );
    }

    #[test]
    fn parse_rejects_empty_line() {
        assert_eq!(CommandParser::parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn parse_rejects_quit_with_params() {
        assert_eq!(
            CommandParser::parse("1q"),
            Err(ParseError::UnknownCommand('q'))
        );
    }

    #[test]
    fn dispatch_print_with_zero_address_emits_single_marker() {
        let mut editor = Editor::new();
        let mut out = Vec::new();
        dispatch(
            &mut editor,
            &ParsedCommand::Print { start: 0, end: 3 },
            Vec::new(),
            &mut out,
        )
        .unwrap();
        assert_eq!(out, b".\n");
    }

    #[test]
    fn dispatch_change_then_print() {
        let mut editor = Editor::new();
        let mut out = Vec::new();
        dispatch(
            &mut editor,
            &ParsedCommand::Change { start: 1, end: 2 },
            vec![Line::from("alpha"), Line::from("beta")],
            &mut out,
        )
        .unwrap();
        dispatch(
            &mut editor,
            &ParsedCommand::Print { start: 1, end: 3 },
            Vec::new(),
            &mut out,
        )
        .unwrap();
        assert_eq!(out, b"alpha\nbeta\n.\n");
    }

    #[test]
    fn dispatch_quit_signals_caller() {
        let mut editor = Editor::new();
        let mut out = Vec::new();
        let result = dispatch(&mut editor, &ParsedCommand::Quit, Vec::new(), &mut out).unwrap();
        assert!(result.quit);
    }
}
