use std::fs;

use bcastcheck::{check_perfect_links, Error, MessageId, PerfectLinksReport, ProcessId};
use insta::assert_snapshot;
use tempfile::TempDir;

const HOSTS: &str = "1 localhost 11001\n2 localhost 11002\n5 localhost 11005\n";
const CONFIG: &str = "10 1\n";

fn msg(sender: usize, seq: u64) -> MessageId {
    MessageId {
        sender: ProcessId::new(sender).unwrap(),
        seq,
    }
}

struct Run {
    dir: TempDir,
}

impl Run {
    fn new(logs: &[(usize, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hosts"), HOSTS).unwrap();
        fs::write(dir.path().join("config"), CONFIG).unwrap();
        fs::create_dir(dir.path().join("output")).unwrap();
        for (id, text) in logs {
            fs::write(dir.path().join("output").join(format!("{id}.output")), text).unwrap();
        }
        Self { dir }
    }

    fn check(&self) -> bcastcheck::Result<PerfectLinksReport> {
        let root = self.dir.path();
        check_perfect_links(&root.join("hosts"), &root.join("config"), &root.join("output"))
    }
}

#[test]
fn sent_messages_delivered_once_pass() {
    let run = Run::new(&[
        (1, "d 5 1\nd 2 1\nd 5 2\n"),
        (2, "b 1\nb 2\n"),
        (5, "b 1\nb 2\nb 3\n"),
    ]);
    let report = run.check().unwrap();
    assert_eq!(
        report,
        PerfectLinksReport {
            senders: 2,
            sent: 5,
            delivered: 3,
        }
    );
}

#[test]
fn duplicate_delivery_is_fatal() {
    let run = Run::new(&[(1, "d 5 10\nd 2 1\nd 5 10\n"), (2, "b 1\n"), (5, "b 10\n")]);
    let err = run.check().unwrap_err();
    assert!(matches!(
        err,
        Error::DuplicateDelivery { line: 3, message, .. } if message == msg(5, 10)
    ));
    assert_snapshot!(
        err.to_string(),
        @"1.output, line 3: found message 10 from process 5 delivered more than once"
    );
}

#[test]
fn delivery_never_sent_is_fatal() {
    let run = Run::new(&[(1, "d 5 10\n"), (2, ""), (5, "b 1\nb 2\n")]);
    let err = run.check().unwrap_err();
    assert!(matches!(err, Error::MessageNotSent(m) if m == msg(5, 10)));
    assert_snapshot!(err.to_string(), @"message 10 from process 5 was delivered but not sent");
}

#[test]
fn delivery_from_unknown_sender_is_not_sent() {
    let run = Run::new(&[(1, "d 3 1\n"), (2, ""), (5, "")]);
    assert!(matches!(
        run.check(),
        Err(Error::MessageNotSent(m)) if m == msg(3, 1)
    ));
}

#[test]
fn sender_logs_only_broadcast() {
    let run = Run::new(&[(1, ""), (2, "b 1\nd 5 1\n"), (5, "")]);
    assert!(matches!(
        run.check(),
        Err(Error::InvalidSenderLog { line: 2, .. })
    ));
}

#[test]
fn receiver_log_only_delivers() {
    let run = Run::new(&[(1, "d 2 1\nb 1\n"), (2, "b 1\n"), (5, "")]);
    assert!(matches!(
        run.check(),
        Err(Error::InvalidReceiverLog { line: 2, .. })
    ));
}

#[test]
fn one_output_per_host() {
    let run = Run::new(&[(1, ""), (2, "")]);
    assert!(matches!(
        run.check(),
        Err(Error::OutputCountMismatch {
            found: 2,
            expected: 3
        })
    ));

    let run = Run::new(&[(1, ""), (2, ""), (4, "")]);
    assert!(matches!(run.check(), Err(Error::MissingOutput(_))));
}

#[test]
fn receiver_must_be_a_host() {
    let run = Run::new(&[(1, ""), (2, ""), (5, "")]);
    fs::write(run.dir.path().join("config"), "10 4\n").unwrap();
    assert!(matches!(
        run.check(),
        Err(Error::MalformedConfig { line: 1, .. })
    ));
}
