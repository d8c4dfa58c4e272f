//! JSONL activity log: one line per [`ActivityEvent`], written by a dedicated
//! logger thread so no actor ever blocks on disk I/O.
//!
//! Two-level degradation (a run is short-lived and loopback-only, so a
//! second on-disk fallback tier buys nothing):
//! 1. The configured file path.
//! 2. stderr with a `[LIFT-LOG]` prefix, if the file can't be opened or a write fails.

#![allow(missing_docs)]

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread::JoinHandle;

use chrono::Utc;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::Serialize;

use crate::core::errors::{LiftError, Result};
use crate::logger::activity::{ActivityEvent, Severity};

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Serialize)]
struct LogLine<'a> {
    ts: String,
    severity: Severity,
    #[serde(flatten)]
    event: &'a ActivityEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

struct JsonlWriter {
    path: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    mirror_stdout: bool,
}

impl JsonlWriter {
    fn open(path: Option<PathBuf>, mirror_stdout: bool) -> Self {
        let mut w = Self {
            path,
            writer: None,
            state: WriterState::Discard,
            mirror_stdout,
        };
        w.try_open();
        w
    }

    fn try_open(&mut self) {
        let Some(path) = &self.path else {
            self.state = WriterState::Stderr;
            return;
        };
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Normal;
            }
            Err(e) => {
                let _ = writeln!(io::stderr(), "[LIFT-LOG] failed to open {}: {e}", path.display());
                self.state = WriterState::Stderr;
            }
        }
    }

    fn write(&mut self, event: &ActivityEvent) {
        let line = LogLine {
            ts: Utc::now().to_rfc3339(),
            severity: event.severity(),
            event,
        };
        let Ok(json) = serde_json::to_string(&line) else {
            let _ = writeln!(io::stderr(), "[LIFT-LOG] failed to serialize event");
            return;
        };

        match self.state {
            WriterState::Normal => {
                if let Some(w) = self.writer.as_mut() {
                    if writeln!(w, "{json}").is_err() || w.flush().is_err() {
                        self.writer = None;
                        self.state = WriterState::Stderr;
                        let _ = writeln!(io::stderr(), "[LIFT-LOG] {json}");
                    }
                }
            }
            WriterState::Stderr => {
                let _ = writeln!(io::stderr(), "[LIFT-LOG] {json}");
            }
            WriterState::Discard => {}
        }

        if self.mirror_stdout {
            mirror_to_stdout(event);
        }
    }
}

#[cfg(feature = "cli")]
fn mirror_to_stdout(event: &ActivityEvent) {
    use colored::Colorize;
    let line = format!("{event:?}");
    let colored = match event.severity() {
        Severity::Info => line.normal(),
        Severity::Warning => line.yellow(),
        Severity::Critical => line.red().bold(),
    };
    println!("{colored}");
}

#[cfg(not(feature = "cli"))]
fn mirror_to_stdout(event: &ActivityEvent) {
    println!("{event:?}");
}

/// Handle to the logger thread: clone freely, every clone shares the one sink.
#[derive(Clone)]
pub struct ActivityLogger {
    tx: Sender<ActivityEvent>,
}

impl ActivityLogger {
    /// Spawn the logger thread. `path` is the JSONL sink; `None` goes straight
    /// to stderr. `mirror_stdout` additionally echoes every event to stdout
    /// (colored under the `cli` feature).
    pub fn spawn(path: Option<PathBuf>, mirror_stdout: bool) -> Result<(Self, JoinHandle<()>)> {
        let (tx, rx): (Sender<ActivityEvent>, Receiver<ActivityEvent>) =
            crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let handle = std::thread::Builder::new()
            .name("liftsim-logger".into())
            .spawn(move || {
                let mut writer = JsonlWriter::open(path, mirror_stdout);
                for event in rx.iter() {
                    writer.write(&event);
                }
            })
            .map_err(|source| LiftError::Runtime {
                details: format!("failed to spawn logger thread: {source}"),
            })?;
        Ok((Self { tx }, handle))
    }

    /// Enqueue an event. Never blocks the caller: a full channel drops the
    /// event and counts as a lost log line rather than stalling an actor.
    pub fn log(&self, event: ActivityEvent) {
        match self.tx.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                let _ = writeln!(io::stderr(), "[LIFT-LOG] channel full, dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn writes_jsonl_line_per_event() {
        let file = NamedTempFile::new().unwrap();
        let (logger, handle) = ActivityLogger::spawn(Some(file.path().to_path_buf()), false).unwrap();
        logger.log(ActivityEvent::CarDecommissioned { car_id: 7 });
        drop(logger);
        handle.join().unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = contents.lines();
        let parsed: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(parsed["event"], "car_decommissioned");
        assert_eq!(parsed["car_id"], 7);
        assert!(parsed["ts"].is_string());
        assert_eq!(parsed["severity"], "critical");
        assert!(lines.next().is_none());
    }

    #[test]
    fn falls_back_to_stderr_when_no_path_given() {
        let (logger, handle) = ActivityLogger::spawn(None, false).unwrap();
        logger.log(ActivityEvent::RunStarted {
            num_elevators: 4,
            input_file: "in.txt".into(),
        });
        drop(logger);
        handle.join().unwrap();
    }
}
