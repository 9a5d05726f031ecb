use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::event::{MessageId, ProcessId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Input-integrity failures. Any of these means the trace cannot be
/// interpreted, so the run is aborted.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(code(bcastcheck::io))]
    Io(#[from] std::io::Error),

    #[error("{file}, line {line}: malformed log line")]
    #[diagnostic(
        code(bcastcheck::malformed_log_line),
        help("log lines are `b <seq>` or `d <sender> <seq>`")
    )]
    MalformedLogLine {
        file: String,
        line: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a broadcast or delivery event")]
        span: SourceSpan,
    },

    #[error("{file}, line {line}: malformed configuration: {reason}")]
    #[diagnostic(code(bcastcheck::malformed_config))]
    MalformedConfig {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("{file}, line {line}: malformed hosts entry: {reason}")]
    #[diagnostic(code(bcastcheck::malformed_hosts))]
    MalformedHosts {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("output file name {} does not start with a process id", .0.display())]
    #[diagnostic(
        code(bcastcheck::invalid_output_name),
        help("output files are named `<process id>.output`")
    )]
    InvalidOutputName(PathBuf),

    #[error("Not as many output files as number of processes: found {found}, expected {expected}")]
    #[diagnostic(code(bcastcheck::output_count_mismatch))]
    OutputCountMismatch { found: usize, expected: usize },

    #[error("no output file for process {0}")]
    #[diagnostic(code(bcastcheck::missing_output))]
    MissingOutput(ProcessId),

    #[error("{file}, line {line}: process {process} is not part of this run of {process_count} processes")]
    #[diagnostic(code(bcastcheck::unknown_process))]
    UnknownProcess {
        file: String,
        line: usize,
        process: ProcessId,
        process_count: usize,
    },

    #[error("{file}: output of process {process}, but the configuration has {process_count} processes")]
    #[diagnostic(code(bcastcheck::process_out_of_range))]
    ProcessOutOfRange {
        file: String,
        process: ProcessId,
        process_count: usize,
    },

    #[error("{file}, line {line}: message {message} was already broadcast")]
    #[diagnostic(code(bcastcheck::duplicate_broadcast))]
    DuplicateBroadcast {
        file: String,
        line: usize,
        message: MessageId,
    },

    #[error("{file}, line {line}: delivered message {message} has no broadcast in its sender's log")]
    #[diagnostic(code(bcastcheck::unknown_message))]
    UnknownMessage {
        file: String,
        line: usize,
        message: MessageId,
    },

    #[error("{file}, line {line}: invalid format for sender output, expected `b <seq>`")]
    #[diagnostic(code(bcastcheck::invalid_sender_log))]
    InvalidSenderLog {
        file: String,
        line: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("line read")]
        span: SourceSpan,
    },

    #[error("{file}, line {line}: invalid format for receiver output, expected `d <sender> <seq>`")]
    #[diagnostic(code(bcastcheck::invalid_receiver_log))]
    InvalidReceiverLog {
        file: String,
        line: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("line read")]
        span: SourceSpan,
    },

    #[error("{file}, line {line}: found message {message} delivered more than once")]
    #[diagnostic(code(bcastcheck::duplicate_delivery))]
    DuplicateDelivery {
        file: String,
        line: usize,
        message: MessageId,
    },

    #[error("message {0} was delivered but not sent")]
    #[diagnostic(code(bcastcheck::message_not_sent))]
    MessageNotSent(MessageId),
}
