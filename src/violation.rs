use std::fmt;

use crate::event::{MessageId, ProcessId};
use crate::vclock::VectorClock;

/// A safety property the logged run breaks. Unlike [`crate::Error`], a violation says the
/// algorithm under test misbehaved; the logs themselves were readable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    OutOfOrderBroadcast {
        process: ProcessId,
        line: usize,
        expected: u64,
        got: u64,
    },
    OutOfOrderDelivery {
        process: ProcessId,
        line: usize,
        sender: ProcessId,
        expected: u64,
        got: u64,
    },
    /// `process` delivered `message` while its receive clock was not yet at or above the
    /// message's reconstructed clock.
    Causal {
        process: ProcessId,
        line: usize,
        message: MessageId,
        required: VectorClock,
        observed: VectorClock,
    },
}

impl Violation {
    pub fn process(&self) -> ProcessId {
        match self {
            Violation::OutOfOrderBroadcast { process, .. }
            | Violation::OutOfOrderDelivery { process, .. }
            | Violation::Causal { process, .. } => *process,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Violation::OutOfOrderBroadcast { line, .. }
            | Violation::OutOfOrderDelivery { line, .. }
            | Violation::Causal { line, .. } => *line,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File {}.output, Line {}: ", self.process(), self.line())?;
        match self {
            Violation::OutOfOrderBroadcast { expected, got, .. } => write!(
                f,
                "Messages broadcast out of order. Expected message {expected} but broadcast message {got}"
            ),
            Violation::OutOfOrderDelivery {
                sender,
                expected,
                got,
                ..
            } => write!(
                f,
                "Message delivered out of order. Expected message {expected} from process {sender}, but delivered message {got}"
            ),
            Violation::Causal {
                message,
                required,
                observed,
                ..
            } => write!(
                f,
                "Message {message} delivered before its causal past. Vector clock {required} is not covered by {observed}"
            ),
        }
    }
}
