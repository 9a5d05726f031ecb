//! Perfect links between many senders and one designated receiver.
//!
//! Checks no-duplication and no-creation. Validity (every sent message is eventually delivered)
//! is a liveness property and is not checked.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event::{parse_event, Event, EventLog, MessageId, ProcessId};

/// Sequence numbers of the messages a sender sent.
pub fn read_sender_log(log: &EventLog) -> Result<BTreeSet<u64>> {
    let mut sent = BTreeSet::new();
    for line in log.lines() {
        match parse_event(line.text) {
            Some(Event::Broadcast { seq }) => {
                sent.insert(seq);
            }
            _ => {
                return Err(Error::InvalidSenderLog {
                    file: log.name().to_owned(),
                    line: line.number,
                    src: log.source(),
                    span: line.span(),
                })
            }
        }
    }
    debug!(file = log.name(), sent = sent.len(), "Read sender log");
    Ok(sent)
}

/// Messages delivered by the receiver, by sender. Fails on the first message delivered twice.
pub fn read_receiver_log(log: &EventLog) -> Result<BTreeMap<ProcessId, BTreeSet<u64>>> {
    let mut delivered: BTreeMap<ProcessId, BTreeSet<u64>> = BTreeMap::new();
    for line in log.lines() {
        let Some(Event::Deliver { sender, seq }) = parse_event(line.text) else {
            return Err(Error::InvalidReceiverLog {
                file: log.name().to_owned(),
                line: line.number,
                src: log.source(),
                span: line.span(),
            });
        };
        if !delivered.entry(sender).or_default().insert(seq) {
            return Err(Error::DuplicateDelivery {
                file: log.name().to_owned(),
                line: line.number,
                message: MessageId { sender, seq },
            });
        }
    }
    debug!(
        file = log.name(),
        senders = delivered.len(),
        "Read receiver log"
    );
    Ok(delivered)
}

/// Every delivered message must appear in its sender's log.
pub fn check_no_creation(
    delivered: &BTreeMap<ProcessId, BTreeSet<u64>>,
    sent: &BTreeMap<ProcessId, BTreeSet<u64>>,
) -> Result<()> {
    for (&sender, seqs) in delivered {
        let sent_by_sender = sent.get(&sender);
        for &seq in seqs {
            if !sent_by_sender.is_some_and(|s| s.contains(&seq)) {
                return Err(Error::MessageNotSent(MessageId { sender, seq }));
            }
        }
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerfectLinksReport {
    pub senders: usize,
    pub sent: usize,
    pub delivered: usize,
}

impl PerfectLinksReport {
    pub fn new(
        sent: &BTreeMap<ProcessId, BTreeSet<u64>>,
        delivered: &BTreeMap<ProcessId, BTreeSet<u64>>,
    ) -> Self {
        let report = Self {
            senders: sent.len(),
            sent: sent.values().map(BTreeSet::len).sum(),
            delivered: delivered.values().map(BTreeSet::len).sum(),
        };
        info!(?report, "Perfect links hold");
        report
    }
}
