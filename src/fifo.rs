//! FIFO order: every process broadcasts `1, 2, 3, ...` and delivers the messages of each sender
//! in the order that sender broadcast them.
//!
//! Checking a file stops at its first violation.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::event::{Event, LoggedEvent, ProcessId};
use crate::violation::Violation;

/// Replay state for one process's log.
#[derive(Clone, Debug)]
pub struct FifoChecker {
    process: ProcessId,
    next_broadcast: u64,
    next_from: HashMap<ProcessId, u64>,
    delivered: u64,
}

impl FifoChecker {
    pub fn new(process: ProcessId) -> Self {
        Self {
            process,
            next_broadcast: 1,
            next_from: HashMap::new(),
            delivered: 0,
        }
    }

    /// Advances past `event`, or returns the violation it constitutes. State is left untouched
    /// on a violation.
    pub fn step(&mut self, logged: &LoggedEvent) -> Result<(), Violation> {
        match logged.event {
            Event::Broadcast { seq } => {
                if seq != self.next_broadcast {
                    return Err(Violation::OutOfOrderBroadcast {
                        process: self.process,
                        line: logged.line,
                        expected: self.next_broadcast,
                        got: seq,
                    });
                }
                self.next_broadcast += 1;
            }
            Event::Deliver { sender, seq } => {
                let expected = self.next_from.entry(sender).or_insert(1);
                if seq != *expected {
                    return Err(Violation::OutOfOrderDelivery {
                        process: self.process,
                        line: logged.line,
                        sender,
                        expected: *expected,
                        got: seq,
                    });
                }
                *expected += 1;
                self.delivered += 1;
            }
        }
        Ok(())
    }

    /// Number of in-order deliveries seen so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

/// Outcome of checking one output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReport {
    pub process: ProcessId,
    pub path: PathBuf,
    pub violation: Option<Violation>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.violation.is_none()
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checking {}", self.path.display())?;
        match &self.violation {
            None => write!(f, "Validation OK"),
            Some(violation) => write!(f, "{violation}\nValidation failed!"),
        }
    }
}

/// Displays as the report `bcastcheck fifo` prints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FifoReport {
    pub files: Vec<FileReport>,
    /// Deliveries accepted across all files, up to each file's first violation.
    pub delivered: u64,
}

impl FifoReport {
    pub fn failures(&self) -> usize {
        self.files.iter().filter(|f| !f.is_ok()).count()
    }

    pub fn is_correct(&self) -> bool {
        self.failures() == 0
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.files.iter().filter_map(|f| f.violation.as_ref())
    }

    /// Checks one parsed log and records the outcome.
    pub fn check_file(&mut self, process: ProcessId, path: PathBuf, events: &[LoggedEvent]) {
        let (violation, delivered) = check_events(process, events);
        self.delivered += delivered;
        self.files.push(FileReport {
            process,
            path,
            violation,
        });
    }
}

impl FifoReport {
    pub(crate) fn write_files(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{file}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FifoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_files(f)?;
        if !self.is_correct() {
            return writeln!(f, "Number of failures detected: {}", self.failures());
        }
        writeln!(f, "All output files are correct")?;
        writeln!(f, "Number of delivered messages in total: {}", self.delivered)
    }
}

/// Replays `events` until the first violation. Returns that violation, if any, and the number
/// of deliveries accepted before it.
pub fn check_events(process: ProcessId, events: &[LoggedEvent]) -> (Option<Violation>, u64) {
    let mut checker = FifoChecker::new(process);
    for event in events {
        if let Err(violation) = checker.step(event) {
            debug!(%violation, "FIFO violation");
            return (Some(violation), checker.delivered());
        }
    }
    (None, checker.delivered())
}
