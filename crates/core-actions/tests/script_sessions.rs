//! Whole-session scripts run through `run_session`, asserting on the exact
//! byte stream a host would see.

use core_actions::run_session;
use core_state::Editor;

fn run(script: &str) -> (String, core_actions::SessionSummary) {
    let mut editor = Editor::new();
    let mut out = Vec::new();
    let summary = run_session(&mut editor, script.as_bytes(), &mut out).unwrap();
    (String::from_utf8(out).unwrap(), summary)
}

#[test]
fn change_delete_undo_redo_session() {
    let script = "\
1,2c
hello
world
.
1,1d
1,2p
2u
1,2p
2r
1,1p
q
";
    let (output, summary) = run(script);
    assert_eq!(output, "world\n.\n.\n.\nworld\n");
    assert_eq!(summary.commands, 8);
    assert_eq!(summary.parse_errors, 0);
}

#[test]
fn undo_is_deferred_until_next_print() {
    // The undo run clamps at pristine, the redo walks one step forward, and
    // the print flushes the single net step.
    let script = "\
1,1c
first
.
1,1c
second
.
5u
1r
1,1p
q
";
    let (output, _) = run(script);
    assert_eq!(output, "first\n");
}

#[test]
fn new_change_after_undo_discards_redo() {
    let script = "\
1,1c
A
.
1u
1,1c
B
.
1r
1,1p
q
";
    let (output, _) = run(script);
    assert_eq!(output, "B\n");
}

#[test]
fn print_with_zero_address_prints_single_marker() {
    let script = "0,0p\nq\n";
    let (output, _) = run(script);
    assert_eq!(output, ".\n");
}

#[test]
fn mismatched_change_payload_is_skipped() {
    let script = "\
1,3c
only one line
.
1,1p
q
";
    let (output, summary) = run(script);
    assert_eq!(output, ".\n");
    assert_eq!(summary.payload_mismatches, 1);
    assert_eq!(summary.commands, 2);
}

#[test]
fn unknown_commands_are_skipped_not_fatal() {
    let script = "\
1,1x
1,1c
kept
.
1,1p
q
";
    let (output, summary) = run(script);
    assert_eq!(output, "kept\n");
    assert_eq!(summary.parse_errors, 1);
}

#[test]
fn out_of_range_change_is_rejected_and_counted() {
    let script = "\
5,5c
orphan
.
1,1p
q
";
    let (output, summary) = run(script);
    assert_eq!(output, ".\n");
    assert_eq!(summary.rejected, 1);
}

#[test]
fn session_ends_at_eof_without_quit() {
    let script = "1,1c\nlast\n.\n1,1p\n";
    let (output, summary) = run(script);
    assert_eq!(output, "last\n");
    assert_eq!(summary.commands, 2);
}

#[test]
fn delete_range_then_undo_restores_middle() {
    let script = "\
1,4c
a
b
c
d
.
2,3d
1,4p
1u
1,4p
q
";
    let (output, _) = run(script);
    assert_eq!(output, "a\nd\n.\n.\na\nb\nc\nd\n");
}
