use std::fs;

use bcastcheck::{check_fifo, Error, FifoReport, ProcessId, Violation};
use insta::assert_snapshot;
use tempfile::TempDir;

fn pid(id: usize) -> ProcessId {
    ProcessId::new(id).unwrap()
}

/// The report as the CLI prints it, with the temporary directory replaced by `<out>`.
fn rendered(run: &TempDir, report: &FifoReport) -> String {
    report
        .to_string()
        .replace(run.path().to_str().unwrap(), "<out>")
}

fn write_run(logs: &[(usize, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (id, text) in logs {
        fs::write(dir.path().join(format!("{id}.output")), text).unwrap();
    }
    dir
}

#[test]
fn in_order_deliveries_pass() {
    let run = write_run(&[(1, "d 2 1\nd 2 2\n"), (2, "b 1\nb 2\n")]);
    let report = check_fifo(run.path(), 2).unwrap();
    assert!(report.is_correct());
    assert_eq!(report.failures(), 0);
    assert_eq!(report.delivered, 2);
    assert_eq!(
        report.files.iter().map(|f| f.process).collect::<Vec<_>>(),
        vec![pid(1), pid(2)]
    );
    assert_snapshot!(rendered(&run, &report), @r"
    Checking <out>/1.output
    Validation OK
    Checking <out>/2.output
    Validation OK
    All output files are correct
    Number of delivered messages in total: 2
    ");
}

#[test]
fn out_of_order_delivery_fails() {
    let run = write_run(&[(1, "b 1\n"), (2, "b 1\nb 2\nd 2 2\nd 2 1\n")]);
    let report = check_fifo(run.path(), 2).unwrap();
    assert!(!report.is_correct());
    assert_eq!(report.failures(), 1);
    let violations: Vec<_> = report.violations().collect();
    assert_eq!(
        violations,
        vec![&Violation::OutOfOrderDelivery {
            process: pid(2),
            line: 3,
            sender: pid(2),
            expected: 1,
            got: 2,
        }]
    );
    assert_snapshot!(
        violations[0].to_string(),
        @"File 2.output, Line 3: Message delivered out of order. Expected message 1 from process 2, but delivered message 2"
    );
    assert_snapshot!(rendered(&run, &report), @r"
    Checking <out>/1.output
    Validation OK
    Checking <out>/2.output
    File 2.output, Line 3: Message delivered out of order. Expected message 1 from process 2, but delivered message 2
    Validation failed!
    Number of failures detected: 1
    ");
}

#[test]
fn out_of_order_broadcast_stops_the_file() {
    // Line 3 is also out of order but is never reached.
    let run = write_run(&[(1, "b 1\nb 3\nd 1 2\n")]);
    let report = check_fifo(run.path(), 1).unwrap();
    assert_eq!(report.failures(), 1);
    assert_eq!(
        report.files[0].violation,
        Some(Violation::OutOfOrderBroadcast {
            process: pid(1),
            line: 2,
            expected: 2,
            got: 3,
        })
    );
    assert_snapshot!(
        report.files[0].violation.as_ref().unwrap().to_string(),
        @"File 1.output, Line 2: Messages broadcast out of order. Expected message 2 but broadcast message 3"
    );
}

#[test]
fn every_file_is_checked() {
    let run = write_run(&[
        (1, "b 2\n"),
        (2, "b 1\nd 2 1\nd 1 1\n"),
        (3, "d 3 2\nb 1\n"),
    ]);
    let report = check_fifo(run.path(), 3).unwrap();
    assert_eq!(report.failures(), 2);
    assert!(report.files[1].is_ok());
    assert_eq!(
        report.violations().map(|v| v.process()).collect::<Vec<_>>(),
        vec![pid(1), pid(3)]
    );
}

#[test]
fn senders_are_tracked_independently() {
    let run = write_run(&[
        (1, "b 1\nd 2 1\nd 1 1\nd 3 1\nd 2 2\nb 2\nd 3 2\nd 1 2\n"),
        (2, "b 1\nb 2\n"),
        (3, "b 1\nb 2\n"),
    ]);
    let report = check_fifo(run.path(), 3).unwrap();
    assert!(report.is_correct());
    assert_eq!(report.delivered, 6);
}

#[test]
fn output_count_must_match() {
    let run = write_run(&[(1, "b 1\n"), (2, "b 1\n")]);
    let err = check_fifo(run.path(), 3).unwrap_err();
    assert!(matches!(
        err,
        Error::OutputCountMismatch {
            found: 2,
            expected: 3
        }
    ));
}

#[test]
fn other_files_are_ignored() {
    let run = write_run(&[(1, "b 1\n")]);
    fs::write(run.path().join("hosts"), "1 localhost 11001\n").unwrap();
    fs::write(run.path().join("1.stdout"), "garbage\n").unwrap();
    let report = check_fifo(run.path(), 1).unwrap();
    assert!(report.is_correct());
}

#[cfg(unix)]
#[test]
fn symlinked_outputs_are_checked() {
    let logs = tempfile::tempdir().unwrap();
    fs::write(logs.path().join("2.log"), "b 1\nb 2\n").unwrap();
    let run = write_run(&[(1, "d 2 2\n")]);
    std::os::unix::fs::symlink(logs.path().join("2.log"), run.path().join("2.output")).unwrap();
    let report = check_fifo(run.path(), 2).unwrap();
    assert_eq!(report.files.len(), 2);
    assert_eq!(
        report.violations().map(|v| v.process()).collect::<Vec<_>>(),
        vec![pid(1)]
    );
}

#[test]
fn output_names_must_be_process_ids() {
    let run = write_run(&[(1, "b 1\n")]);
    fs::write(run.path().join("proc.output"), "b 1\n").unwrap();
    assert!(matches!(
        check_fifo(run.path(), 2),
        Err(Error::InvalidOutputName(_))
    ));
}

#[test]
fn malformed_line_is_fatal() {
    let run = write_run(&[(1, "b 1\nbroadcast 2\n")]);
    assert!(matches!(
        check_fifo(run.path(), 1),
        Err(Error::MalformedLogLine { line: 2, .. })
    ));
}

#[test]
fn rerun_is_identical() {
    let run = write_run(&[(1, "b 1\nd 2 2\n"), (2, "b 1\nb 2\n")]);
    let first = check_fifo(run.path(), 2).unwrap();
    let second = check_fifo(run.path(), 2).unwrap();
    assert_eq!(first, second);
}
