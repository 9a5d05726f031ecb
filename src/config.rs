//! Static run descriptions: the causal dependency configuration, the hosts file and the
//! perfect-links configuration.

use std::path::Path;

use fs_err as fs;
use pest::Parser;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event::{file_name, numbered_lines, ProcessId};
use crate::{Rule, TraceParser};

/// Which senders each process treats as causally relevant to its own broadcasts.
///
/// ```text
/// <message count>
/// 1 <dep> <dep> ...
/// 2 <dep> ...
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyConfig {
    message_count: u64,
    /// `dependencies[p.index()][s.index()]` is set iff `p` depends on `s`.
    dependencies: Vec<Vec<bool>>,
}

impl DependencyConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let config = Self::parse(&file_name(path), &fs::read_to_string(path)?)?;
        info!(
            processes = config.process_count(),
            messages = config.message_count,
            "Loaded dependency configuration"
        );
        Ok(config)
    }

    pub fn parse(file: &str, text: &str) -> Result<Self> {
        let malformed = |line: usize, reason: String| Error::MalformedConfig {
            file: file.to_owned(),
            line,
            reason,
        };

        let mut lines = numbered_lines(text);
        let header = lines
            .next()
            .ok_or_else(|| malformed(1, "missing message count".into()))?;
        let message_count = match number_list(header.text).as_deref() {
            Some([count]) => *count,
            _ => {
                return Err(malformed(
                    header.number,
                    format!("expected the message count, found `{}`", header.text.trim()),
                ))
            }
        };

        let mut rows = Vec::new();
        for line in lines {
            if line.is_blank() {
                return Err(malformed(line.number, "empty dependency line".into()));
            }
            let numbers = number_list(line.text).ok_or_else(|| {
                malformed(
                    line.number,
                    format!("expected `<process> <dependencies>...`, found `{}`", line.text.trim()),
                )
            })?;
            rows.push((line.number, numbers));
        }

        let process_count = rows.len();
        let mut dependencies = vec![vec![false; process_count]; process_count];
        for (row, (line, numbers)) in rows.into_iter().enumerate() {
            // The grammar guarantees at least one number.
            let (own, deps) = numbers
                .split_first()
                .ok_or_else(|| malformed(line, "empty dependency line".into()))?;
            if *own != row as u64 + 1 {
                return Err(malformed(
                    line,
                    format!("expected process {} on this line, found {own}", row + 1),
                ));
            }
            for dep in deps {
                let dep = ProcessId::try_from(*dep)
                    .ok()
                    .filter(|d| d.get() <= process_count)
                    .ok_or_else(|| {
                        malformed(
                            line,
                            format!("dependency {dep} is not one of the {process_count} processes"),
                        )
                    })?;
                dependencies[row][dep.index()] = true;
            }
            debug!(process = row + 1, deps = ?deps, "Dependencies");
        }

        Ok(Self {
            message_count,
            dependencies,
        })
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn process_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn depends_on(&self, process: ProcessId, sender: ProcessId) -> bool {
        self.dependencies[process.index()][sender.index()]
    }

    pub fn dependencies_of(&self, process: ProcessId) -> impl Iterator<Item = ProcessId> + '_ {
        ProcessId::all(self.process_count()).filter(move |s| self.depends_on(process, *s))
    }
}

/// Process ids listed in a hosts file, in file order. Only the first token of each line
/// matters; the address and port that follow are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hosts {
    ids: Vec<ProcessId>,
}

impl Hosts {
    pub fn read(path: &Path) -> Result<Self> {
        Self::parse(&file_name(path), &fs::read_to_string(path)?)
    }

    pub fn parse(file: &str, text: &str) -> Result<Self> {
        let mut ids: Vec<ProcessId> = Vec::new();
        for line in numbered_lines(text) {
            let malformed = |reason: String| Error::MalformedHosts {
                file: file.to_owned(),
                line: line.number,
                reason,
            };
            let id = host_id(line.text).ok_or_else(|| {
                malformed(format!("expected a process id, found `{}`", line.text.trim()))
            })?;
            if ids.contains(&id) {
                return Err(malformed(format!("process {id} is listed twice")));
            }
            ids.push(id);
        }
        debug!(hosts = ids.len(), "Loaded hosts");
        Ok(Self { ids })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.ids.iter().copied()
    }
}

/// `<message count> <receiver id>`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerfectLinksConfig {
    pub message_count: u64,
    pub receiver: ProcessId,
}

impl PerfectLinksConfig {
    pub fn read(path: &Path) -> Result<Self> {
        Self::parse(&file_name(path), &fs::read_to_string(path)?)
    }

    pub fn parse(file: &str, text: &str) -> Result<Self> {
        let malformed = |line: usize, reason: String| Error::MalformedConfig {
            file: file.to_owned(),
            line,
            reason,
        };
        let header = numbered_lines(text)
            .next()
            .ok_or_else(|| malformed(1, "missing `<messages> <receiver>` line".into()))?;
        match number_list(header.text).as_deref() {
            Some(&[message_count, receiver]) => {
                let receiver = ProcessId::try_from(receiver)
                    .map_err(|()| malformed(header.number, "receiver id must be positive".into()))?;
                Ok(Self {
                    message_count,
                    receiver,
                })
            }
            _ => Err(malformed(
                header.number,
                format!("expected `<messages> <receiver>`, found `{}`", header.text.trim()),
            )),
        }
    }
}

fn number_list(line: &str) -> Option<Vec<u64>> {
    let list = TraceParser::parse(Rule::number_list, line).ok()?.next()?;
    list.into_inner()
        .filter(|p| p.as_rule() == Rule::number)
        .map(|p| p.as_str().parse::<u64>().ok())
        .collect()
}

fn host_id(line: &str) -> Option<ProcessId> {
    let host = TraceParser::parse(Rule::host_line, line).ok()?.next()?;
    let id = host.into_inner().find(|p| p.as_rule() == Rule::number)?;
    ProcessId::try_from(id.as_str().parse::<u64>().ok()?).ok()
}
