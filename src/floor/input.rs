//! Scripted input file parser: skip two header lines, then one hall call per
//! line as five whitespace-separated tokens.

use std::path::Path;

use crate::core::errors::{LiftError, Result};
use crate::wire::event::{Event, Fault, HallDirection};

const HEADER_LINES: usize = 2;

/// Parse the scripted input file into hall-call events, in file order.
///
/// A malformed record is a hard error: wire events get logged and skipped,
/// but a malformed *script* line means the run was given bad input and
/// should fail fast before any actor starts.
pub fn parse_input_file(path: &Path) -> Result<Vec<Event>> {
    let raw = std::fs::read_to_string(path).map_err(|source| LiftError::InputFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_input(&raw)
}

/// Parse already-read script contents (split out for easy unit testing).
pub fn parse_input(raw: &str) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (line_number, line) in raw.lines().enumerate().skip(HEADER_LINES) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        events.push(parse_record(line_number + 1, trimmed)?);
    }
    Ok(events)
}

fn parse_record(line_number: usize, line: &str) -> Result<Event> {
    let mut tokens = line.split_whitespace();
    let malformed = |details: String| LiftError::MalformedInputLine { line_number, details };

    let time = tokens.next().ok_or_else(|| malformed("missing time".into()))?;
    let source = tokens.next().ok_or_else(|| malformed("missing source".into()))?;
    let floor_button_raw = tokens
        .next()
        .ok_or_else(|| malformed("missing floorButton".into()))?;
    let elevator_button_raw = tokens
        .next()
        .ok_or_else(|| malformed("missing elevatorButton".into()))?;
    let fault_raw = tokens.next().ok_or_else(|| malformed("missing fault".into()))?;

    let origin_floor: i32 = source
        .parse()
        .map_err(|_| malformed(format!("source {source:?} is not a floor number")))?;
    let direction = match floor_button_raw {
        "UP" => HallDirection::Up,
        "DOWN" => HallDirection::Down,
        other => return Err(malformed(format!("unknown floorButton {other:?}"))),
    };
    let elevator_button: i32 = elevator_button_raw
        .parse()
        .map_err(|_| malformed(format!("elevatorButton {elevator_button_raw:?} is not an integer")))?;
    let fault_code: i32 = fault_raw
        .parse()
        .map_err(|_| malformed(format!("fault {fault_raw:?} is not an integer")))?;

    Ok(Event::hall_call(
        time,
        origin_floor,
        direction,
        elevator_button,
        Fault::from_code(fault_code),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_two_header_lines_then_parses_records() {
        let script = "header one\nheader two\n14:05 2 UP 4 0\n14:06 5 DOWN 1 1\n";
        let events = parse_input(script).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].source, "2");
        assert_eq!(events[0].floor_button, Some(HallDirection::Up));
        assert_eq!(events[1].fault, Fault::CarStuck);
    }

    #[test]
    fn blank_lines_between_records_are_skipped() {
        let script = "h1\nh2\n14:05 2 UP 4 0\n\n14:06 3 DOWN 1 0\n";
        let events = parse_input(script).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn malformed_direction_reports_line_number() {
        let script = "h1\nh2\n14:05 2 SIDEWAYS 4 0\n";
        let err = parse_input(script).unwrap_err();
        assert_eq!(err.code(), "LIFT-2001");
        match err {
            LiftError::MalformedInputLine { line_number, .. } => assert_eq!(line_number, 3),
            other => panic!("expected MalformedInputLine, got {other:?}"),
        }
    }

    #[test]
    fn too_few_tokens_is_malformed() {
        let script = "h1\nh2\n14:05 2 UP\n";
        let err = parse_input(script).unwrap_err();
        assert_eq!(err.code(), "LIFT-2001");
    }
}
