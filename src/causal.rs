//! Causal order verification.
//!
//! Verification is two passes over the logs of every process:
//!
//! 1. [`MessageClocks::reconstruct`] replays each process's log and rebuilds the vector clock its
//!    broadcasts must have carried. A process's clock counts the deliveries from the senders it is
//!    configured to depend on; its own slot holds the number of broadcasts it made before.
//! 2. [`check_deliveries`] replays each log again with a receive clock that counts every delivery,
//!    and records a [`Violation::Causal`] whenever a delivered message's clock is not covered by
//!    the receive clock at that point.
//!
//! The first pass completes for all processes before the second starts.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, trace, warn};

use crate::config::DependencyConfig;
use crate::error::{Error, Result};
use crate::event::{Event, LoggedEvent, MessageId, ProcessId};
use crate::vclock::VectorClock;
use crate::violation::Violation;

/// The parsed output file of one process.
#[derive(Clone, Debug)]
pub struct ProcessLog {
    pub process: ProcessId,
    pub file: String,
    pub events: Vec<LoggedEvent>,
}

impl ProcessLog {
    fn known_process(&self, process: ProcessId, line: usize, process_count: usize) -> Result<()> {
        if process.get() > process_count {
            return Err(Error::UnknownProcess {
                file: self.file.clone(),
                line,
                process,
                process_count,
            });
        }
        Ok(())
    }
}

/// Vector clock of every broadcast message, indexed by sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageClocks {
    by_sender: Vec<BTreeMap<u64, VectorClock>>,
}

impl MessageClocks {
    pub fn reconstruct(config: &DependencyConfig, logs: &[ProcessLog]) -> Result<Self> {
        let n = config.process_count();
        let mut by_sender = vec![BTreeMap::new(); n];
        for log in logs {
            let p = log.process;
            if p.get() > n {
                return Err(Error::ProcessOutOfRange {
                    file: log.file.clone(),
                    process: p,
                    process_count: n,
                });
            }
            let mut v_send = VectorClock::new(n);
            let mut seqnum = 0;
            for logged in &log.events {
                match logged.event {
                    Event::Broadcast { seq } => {
                        if seq > config.message_count() {
                            warn!(
                                file = %log.file,
                                line = logged.line,
                                seq,
                                configured = config.message_count(),
                                "Broadcast beyond the configured message count"
                            );
                        }
                        let mut clock = v_send.clone();
                        clock.set(p, seqnum);
                        seqnum += 1;
                        trace!(process = %p, seq, %clock, "Broadcast clock");
                        if by_sender[p.index()].insert(seq, clock).is_some() {
                            return Err(Error::DuplicateBroadcast {
                                file: log.file.clone(),
                                line: logged.line,
                                message: MessageId { sender: p, seq },
                            });
                        }
                    }
                    Event::Deliver { sender, .. } => {
                        log.known_process(sender, logged.line, n)?;
                        if config.depends_on(p, sender) {
                            v_send.increment(sender);
                        }
                    }
                }
            }
            debug!(process = %p, broadcasts = seqnum, "Reconstructed clocks");
        }
        let clocks = Self { by_sender };
        info!(messages = clocks.len(), "Reconstructed message clocks");
        Ok(clocks)
    }

    pub fn get(&self, message: MessageId) -> Option<&VectorClock> {
        self.by_sender.get(message.sender.index())?.get(&message.seq)
    }

    /// Number of broadcast messages.
    pub fn len(&self) -> usize {
        self.by_sender.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Correct => "CORRECT",
            Verdict::Incorrect => "INCORRECT",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CausalReport {
    /// Every causal violation of the run, grouped by process in ascending id order.
    pub violations: Vec<Violation>,
    pub deliveries: u64,
}

impl CausalReport {
    pub fn verdict(&self) -> Verdict {
        if self.violations.is_empty() {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}

/// Replays the deliveries of every process against the reconstructed message clocks.
///
/// Violations are collected, not returned early. A delivery of a message nobody broadcast is
/// fatal, since the trace then cannot be interpreted.
pub fn check_deliveries(
    config: &DependencyConfig,
    clocks: &MessageClocks,
    logs: &[ProcessLog],
) -> Result<CausalReport> {
    let n = config.process_count();
    let mut report = CausalReport::default();
    for log in logs {
        let mut v_recv = VectorClock::new(n);
        for logged in &log.events {
            let Event::Deliver { sender, seq } = logged.event else {
                continue;
            };
            log.known_process(sender, logged.line, n)?;
            let message = MessageId { sender, seq };
            let required = clocks.get(message).ok_or_else(|| Error::UnknownMessage {
                file: log.file.clone(),
                line: logged.line,
                message,
            })?;
            let covered = *required <= v_recv;
            if !covered {
                let violation = Violation::Causal {
                    process: log.process,
                    line: logged.line,
                    message,
                    required: required.clone(),
                    observed: v_recv.clone(),
                };
                debug!(%violation, "Causal violation");
                report.violations.push(violation);
            }
            v_recv.increment(sender);
            report.deliveries += 1;
        }
    }
    Ok(report)
}

/// Reconstructs the message clocks, then checks every delivery against them.
pub fn check(config: &DependencyConfig, logs: &[ProcessLog]) -> Result<CausalReport> {
    let clocks = MessageClocks::reconstruct(config, logs)?;
    check_deliveries(config, &clocks, logs)
}
