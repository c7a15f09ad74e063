//! End-to-end batch runs against stub formatter executables.
#![cfg(unix)]

mod common;

use std::time::{Duration, Instant};

use common::{
    Workspace, DROPS_STATEMENT, EMITS_INVALID_UTF8, HANGS, LEAVES_PIPE_OPEN, PROGRAM,
    REJECTS_INPUT, WHITESPACE_ONLY,
};
use fmtequiv::discovery::FixtureDiscoverer;
use fmtequiv::formatter::{ExternalFormatter, Formatter};
use fmtequiv::harness::{check_file, run_batch, Outcome, ReportOptions};
use fmtequiv::output::OutputBuffer;
use fmtequiv::{ErrorKind, HarnessError, Verdict};

fn run(ws: &Workspace, script: &str, timeout: Duration) -> (fmtequiv::BatchResult, String) {
    let exe = ws.stub_formatter("fmt.sh", script);
    let files = FixtureDiscoverer::discover_fixture_files(ws.fixture_dir(), "prp").unwrap();
    let formatter = ExternalFormatter::new(exe, timeout);
    let mut sink = OutputBuffer::new();
    let result = run_batch(&files, &formatter, &mut sink, &ReportOptions::default());
    (result, sink.buffer)
}

#[test]
fn whitespace_only_formatter_is_equivalent() {
    let ws = Workspace::new();
    ws.fixture("a.prp", "    a = 1;\n\t  b   =  2;\n");
    ws.fixture("b.prp", PROGRAM);

    let (result, out) = run(&ws, WHITESPACE_ONLY, Duration::from_secs(10));

    assert_eq!(result.passed(), 2, "{out}");
    assert_eq!(result.failed(), 0);
    assert_eq!(result.exit_code(), 0);
    assert_eq!(out.matches("SUCCESS (equivalent)").count(), 2);
}

#[test]
fn dropped_statement_is_divergent_with_diff() {
    let ws = Workspace::new();
    let path = ws.fixture("prog.prp", PROGRAM);
    let exe = ws.stub_formatter("fmt.sh", DROPS_STATEMENT);
    let formatter = ExternalFormatter::new(exe, Duration::from_secs(10));

    let Outcome::Checked(Verdict::Divergent(divergence)) = check_file(&path, &formatter) else {
        panic!("expected a divergent verdict");
    };
    assert!(!divergence.diff.is_empty());
    assert_eq!(divergence.diff.removed_count(), 1);
    assert!(divergence
        .diff
        .to_string()
        .contains("-b = a + 2; // add\n"));
}

#[test]
fn one_bad_file_fails_the_batch_but_not_the_rest() {
    let ws = Workspace::new();
    ws.fixture("a.prp", "a = 1;\n");
    ws.fixture("b.prp", "b = 2;\n");
    ws.fixture("c.prp", "c = 3;\n");

    let (result, out) = run(&ws, DROPS_STATEMENT, Duration::from_secs(10));

    assert_eq!(result.total(), 3);
    assert_eq!(result.passed(), 2);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.exit_code(), 1);
    let names: Vec<_> = result
        .files()
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.prp", "b.prp", "c.prp"]);
    assert!(out.contains("b.prp... FAILURE (content differs even when normalized)"));
}

#[test]
fn nonzero_exit_reports_captured_stderr() {
    let ws = Workspace::new();
    ws.fixture("a.prp", "a = 1;\n");

    let (result, out) = run(&ws, REJECTS_INPUT, Duration::from_secs(10));

    assert_eq!(result.failed(), 1);
    let Outcome::Errored(err) = &result.files()[0].outcome else {
        panic!("expected an error outcome");
    };
    assert_eq!(err.kind(), ErrorKind::FormatterInvocationFailed);
    assert!(out.contains("FAILURE (formatter exited with code 3)"));
    assert!(out.contains("parse error in"));
}

#[test]
fn hung_formatter_times_out() {
    let ws = Workspace::new();
    let path = ws.fixture("a.prp", "a = 1;\n");
    let exe = ws.stub_formatter("fmt.sh", HANGS);
    let formatter = ExternalFormatter::new(exe, Duration::from_millis(300));

    let started = Instant::now();
    let err = formatter.format(&path).unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(err.kind(), ErrorKind::FormatterTimeout);
}

#[test]
fn background_process_holding_stdout_times_out() {
    let ws = Workspace::new();
    let path = ws.fixture("a.prp", "a = 1;\n");
    let exe = ws.stub_formatter("fmt.sh", LEAVES_PIPE_OPEN);
    let formatter = ExternalFormatter::new(exe, Duration::from_secs(1));

    let started = Instant::now();
    let err = formatter.format(&path).unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(4), "{:?}", started.elapsed());
    assert_eq!(err.kind(), ErrorKind::FormatterTimeout);
}

#[test]
fn undecodable_text_fails_per_file() {
    let ws = Workspace::new();
    ws.fixture("a.prp", "a = 1;\n");
    ws.fixture_bytes("b.prp", b"b = \xff\xfe;\n");

    let (result, out) = run(&ws, EMITS_INVALID_UTF8, Duration::from_secs(10));

    assert_eq!(result.total(), 2);
    assert_eq!(result.failed(), 2);
    assert_eq!(result.exit_code(), 1);

    let Outcome::Errored(bad_output) = &result.files()[0].outcome else {
        panic!("expected an error outcome for a.prp");
    };
    assert!(matches!(bad_output, HarnessError::FormatterOutput { .. }));
    assert_eq!(bad_output.kind(), ErrorKind::FormatterInvocationFailed);

    let Outcome::Errored(bad_fixture) = &result.files()[1].outcome else {
        panic!("expected an error outcome for b.prp");
    };
    assert_eq!(bad_fixture.kind(), ErrorKind::FileUnreadable);

    assert!(out.contains("a.prp... FAILURE (formatter output is not valid UTF-8)"));
    assert!(out.contains("b.prp... ERROR (could not read file "));
}
