//! Offline verifiers for the output logs of a broadcast testbed run.
//!
//! Each process of a run writes `<id>.output` with its broadcast (`b <seq>`) and delivery
//! (`d <sender> <seq>`) events. After the run, the logs are checked for:
//!
//! - FIFO order ([`check_fifo`])
//! - causal order under a static dependency configuration ([`check_causal`])
//! - no-duplication and no-creation over perfect links ([`check_perfect_links`])
//!
//! Malformed or inconsistent input is a fatal [`Error`]. Misbehavior of the algorithm under test
//! is reported as [`Violation`]s inside the returned report.

use std::fmt;
use std::path::Path;

use pest_derive::Parser;
use tracing::info;

pub mod causal;
pub mod config;
pub mod error;
pub mod event;
pub mod fifo;
pub mod outputs;
pub mod perfect_links;
pub mod vclock;
pub mod violation;

pub use causal::{CausalReport, MessageClocks, ProcessLog, Verdict};
pub use config::{DependencyConfig, Hosts, PerfectLinksConfig};
pub use error::{Error, Result};
pub use event::{Event, EventLog, LoggedEvent, MessageId, ProcessId};
pub use fifo::{FifoReport, FileReport};
pub use outputs::OutputDir;
pub use perfect_links::PerfectLinksReport;
pub use vclock::{CausalOrder, VectorClock};
pub use violation::Violation;

#[derive(Parser)]
#[grammar = "trace.pest"]
pub struct TraceParser;

/// Checks the FIFO property on every output file of `out_dir`, which must hold exactly
/// `process_count` of them.
pub fn check_fifo(out_dir: &Path, process_count: usize) -> Result<FifoReport> {
    let outputs = OutputDir::scan(out_dir)?;
    outputs.expect_count(process_count)?;
    let mut report = FifoReport::default();
    for (process, path) in outputs.iter() {
        let events = EventLog::read(path)?.parse()?;
        report.check_file(process, path.to_path_buf(), &events);
    }
    info!(failures = report.failures(), delivered = report.delivered, "FIFO check done");
    Ok(report)
}

/// Result of [`check_causal`]. Causal order is only checked once FIFO order holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CausalRun {
    pub fifo: FifoReport,
    pub causal: Option<CausalReport>,
}

impl CausalRun {
    pub fn verdict(&self) -> Verdict {
        match &self.causal {
            Some(causal) if self.fifo.is_correct() => causal.verdict(),
            _ => Verdict::Incorrect,
        }
    }
}

impl fmt::Display for CausalRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fifo.write_files(f)?;
        let Some(causal) = &self.causal else {
            writeln!(
                f,
                "Number of failures detected for FIFO property: {}",
                self.fifo.failures()
            )?;
            return writeln!(f, "{}", self.verdict());
        };
        writeln!(f, "All output files respect the FIFO Property")?;
        writeln!(f, "Number of delivered messages in total: {}", self.fifo.delivered)?;
        writeln!(f, "Checking Lcausal property...")?;
        for violation in &causal.violations {
            writeln!(f, "{violation}")?;
        }
        if !causal.violations.is_empty() {
            writeln!(f, "Number of causal violations: {}", causal.violations.len())?;
        }
        writeln!(f, "{}", self.verdict())
    }
}

/// Checks FIFO order and then causal order on the output files of `out_dir`, using the
/// dependency configuration at `config_path`. There must be exactly one output file per
/// configured process.
pub fn check_causal(out_dir: &Path, config_path: &Path) -> Result<CausalRun> {
    let config = DependencyConfig::read(config_path)?;
    let outputs = OutputDir::scan(out_dir)?;
    outputs.expect_count(config.process_count())?;

    let mut fifo = FifoReport::default();
    let mut logs = Vec::with_capacity(config.process_count());
    for process in ProcessId::all(config.process_count()) {
        let path = outputs.path(process)?;
        let log = EventLog::read(path)?;
        let events = log.parse()?;
        fifo.check_file(process, path.to_path_buf(), &events);
        logs.push(ProcessLog {
            process,
            file: log.name().to_owned(),
            events,
        });
    }
    if !fifo.is_correct() {
        info!(failures = fifo.failures(), "FIFO order broken, skipping causal check");
        return Ok(CausalRun { fifo, causal: None });
    }

    let causal = causal::check(&config, &logs)?;
    info!(
        violations = causal.violations.len(),
        deliveries = causal.deliveries,
        "Causal check done"
    );
    Ok(CausalRun {
        fifo,
        causal: Some(causal),
    })
}

/// Checks no-duplication and no-creation between the hosts of `hosts_path` and the receiver
/// named in `config_path`.
pub fn check_perfect_links(
    hosts_path: &Path,
    config_path: &Path,
    out_dir: &Path,
) -> Result<PerfectLinksReport> {
    let hosts = Hosts::read(hosts_path)?;
    let config = PerfectLinksConfig::read(config_path)?;
    if !hosts.contains(config.receiver) {
        return Err(Error::MalformedConfig {
            file: event::file_name(config_path),
            line: 1,
            reason: format!("receiver {} is not listed in the hosts file", config.receiver),
        });
    }
    let outputs = OutputDir::scan(out_dir)?;
    outputs.expect_count(hosts.len())?;

    let mut sent = std::collections::BTreeMap::new();
    for process in hosts.iter().filter(|p| *p != config.receiver) {
        info!(%process, "Reading sender file");
        sent.insert(process, perfect_links::read_sender_log(&outputs.read(process)?)?);
    }
    info!(receiver = %config.receiver, "Reading receiver file");
    let delivered = perfect_links::read_receiver_log(&outputs.read(config.receiver)?)?;
    info!("Checking no creation");
    perfect_links::check_no_creation(&delivered, &sent)?;
    Ok(PerfectLinksReport::new(&sent, &delivered))
}
