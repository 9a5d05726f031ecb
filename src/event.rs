//! Event log parsing.
//!
//! Every process writes one `<id>.output` file with one event per line:
//!
//! ```text
//! b <seq>            this process broadcast its message number `seq`
//! d <sender> <seq>   this process delivered message `seq` broadcast by `sender`
//! ```

use std::fmt;
use std::path::Path;

use fs_err as fs;
use miette::{NamedSource, SourceSpan};
use pest::Parser;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::{Rule, TraceParser};

/// A participant of the run. Ids are dense and start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(usize);

impl ProcessId {
    /// Returns `None` for 0, which never names a process.
    pub fn new(id: usize) -> Option<Self> {
        (id >= 1).then_some(Self(id))
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Slot of this process in any per-process array.
    pub fn index(self) -> usize {
        self.0 - 1
    }

    /// All process ids of a run with `count` processes, in order.
    pub fn all(count: usize) -> impl Iterator<Item = ProcessId> {
        (1..=count).map(ProcessId)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for ProcessId {
    type Error = ();

    fn try_from(value: u64) -> Result<Self, ()> {
        usize::try_from(value)
            .ok()
            .and_then(ProcessId::new)
            .ok_or(())
    }
}

/// A broadcast message, named by its sender and the sender's sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId {
    pub sender: ProcessId,
    pub seq: u64,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from process {}", self.seq, self.sender)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Broadcast { seq: u64 },
    Deliver { sender: ProcessId, seq: u64 },
}

/// An event together with its 1-based line number in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoggedEvent {
    pub line: usize,
    pub event: Event,
}

/// One process's output file, held in memory.
///
/// [`EventLog::events`] can be called any number of times; each call replays the log from the
/// first line.
#[derive(Clone, Debug)]
pub struct EventLog {
    name: String,
    text: String,
}

impl EventLog {
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let name = file_name(path);
        debug!(file = %name, bytes = text.len(), "Read log");
        Ok(Self { name, text })
    }

    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> impl Iterator<Item = Result<LoggedEvent>> + '_ {
        numbered_lines(&self.text).map(move |line| match parse_event(line.text) {
            Some(event) => {
                trace!(file = %self.name, line = line.number, ?event, "Parsed event");
                Ok(LoggedEvent {
                    line: line.number,
                    event,
                })
            }
            None => Err(Error::MalformedLogLine {
                file: self.name.clone(),
                line: line.number,
                src: self.source(),
                span: line.span(),
            }),
        })
    }

    /// Parses the whole log, failing on the first malformed line.
    pub fn parse(&self) -> Result<Vec<LoggedEvent>> {
        let events = self.events().collect::<Result<Vec<_>>>()?;
        debug!(file = %self.name, events = events.len(), "Parsed log");
        Ok(events)
    }

    pub(crate) fn source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.text.clone())
    }

    pub(crate) fn lines(&self) -> impl Iterator<Item = NumberedLine<'_>> {
        numbered_lines(&self.text)
    }
}

/// Name used for `path` in diagnostics.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A line of an input file.
#[derive(Clone, Copy, Debug)]
pub(crate) struct NumberedLine<'a> {
    pub number: usize,
    pub offset: usize,
    pub text: &'a str,
}

impl NumberedLine<'_> {
    pub fn span(&self) -> SourceSpan {
        (self.offset, self.text.len()).into()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Iterates over the lines of `text`, stripped of their terminators. Blank lines after the last
/// non-blank one are dropped; blank lines before it are yielded, and every reader rejects them.
pub(crate) fn numbered_lines(text: &str) -> impl Iterator<Item = NumberedLine<'_>> {
    text[..text.trim_end().len()]
        .split_inclusive('\n')
        .scan(0, |offset, raw| {
            let start = *offset;
            *offset += raw.len();
            Some((start, raw))
        })
        .enumerate()
        .map(|(i, (offset, raw))| NumberedLine {
            number: i + 1,
            offset,
            text: raw.trim_end_matches(['\n', '\r']),
        })
}

pub(crate) fn parse_event(line: &str) -> Option<Event> {
    let log_line = TraceParser::parse(Rule::log_line, line).ok()?.next()?;
    let event = log_line.into_inner().next()?;
    let rule = event.as_rule();
    let mut numbers = event.into_inner().map(|n| n.as_str().parse::<u64>());
    match rule {
        Rule::broadcast => {
            let seq = numbers.next()?.ok()?;
            Some(Event::Broadcast { seq })
        }
        Rule::deliver => {
            let sender = ProcessId::try_from(numbers.next()?.ok()?).ok()?;
            let seq = numbers.next()?.ok()?;
            Some(Event::Deliver { sender, seq })
        }
        _ => None,
    }
}
