//! Equivalence checking and batch reporting.
//!
//! The harness follows a per-file pipeline:
//! 1. **Read**: load the original fixture text
//! 2. **Format**: run the formatter under test on the fixture
//! 3. **Canonicalize**: reduce both texts to canonical form
//! 4. **Compare**: equal canonical forms mean the file is equivalent
//! 5. **Report**: stream the verdict, and the raw-text diff on divergence
//!
//! Files are independent. A failure on one file is recorded and the batch
//! continues, so a single run reports every broken fixture.
//!
//! # Example
//!
//! ```rust,no_run
//! use fmtequiv::harness::{run_batch, ReportOptions};
//! use fmtequiv::formatter::ExternalFormatter;
//! use fmtequiv::output::StdoutSink;
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! let files = vec![PathBuf::from("fixtures/a.prp")];
//! let formatter = ExternalFormatter::new("./prpfmt", Duration::from_secs(30));
//! let mut sink = StdoutSink::new(false);
//! let result = run_batch(&files, &formatter, &mut sink, &ReportOptions::default());
//! std::process::exit(result.exit_code());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::canonical::{canonicalize, CanonicalForm};
use crate::diff::{unified_diff, DiffLine, DiffReport};
use crate::errors::{ErrorKind, HarnessError};
use crate::formatter::Formatter;
use crate::output::{OutputSink, Tone};

// =============================================================================
// VERDICTS
// =============================================================================

/// Why two texts were judged different.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// Line diff of the raw texts, for people.
    pub diff: DiffReport,
    pub original: CanonicalForm,
    pub formatted: CanonicalForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Equivalent,
    Divergent(Divergence),
}

impl Verdict {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, Verdict::Equivalent)
    }

    pub fn diff(&self) -> Option<&DiffReport> {
        match self {
            Verdict::Equivalent => None,
            Verdict::Divergent(divergence) => Some(&divergence.diff),
        }
    }
}

/// Compares an original text with its formatted version.
///
/// Only the canonical forms decide the verdict; the diff is computed
/// afterwards for diagnostics.
pub fn evaluate(original: &str, formatted: &str) -> Verdict {
    let canonical_original = canonicalize(original);
    let canonical_formatted = canonicalize(formatted);
    if canonical_original == canonical_formatted {
        return Verdict::Equivalent;
    }
    Verdict::Divergent(Divergence {
        diff: unified_diff(original, formatted),
        original: canonical_original,
        formatted: canonical_formatted,
    })
}

// =============================================================================
// BATCH RESULTS
// =============================================================================

/// What happened to one file.
#[derive(Debug)]
pub enum Outcome {
    Checked(Verdict),
    Errored(HarnessError),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

impl FileReport {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Checked(Verdict::Equivalent))
    }
}

/// Ordered per-file outcomes with running totals.
#[derive(Debug, Default)]
pub struct BatchResult {
    files: Vec<FileReport>,
    passed: usize,
    failed: usize,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: FileReport) {
        if report.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.files.push(report);
    }

    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    /// True when no file failed. An empty batch passes.
    pub fn is_pass(&self) -> bool {
        self.failed == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_pass() {
            0
        } else {
            1
        }
    }

    pub fn summary(&self) -> JsonSummary {
        JsonSummary {
            passed: self.passed,
            failed: self.failed,
            files: self.files.iter().map(JsonFile::from_report).collect(),
        }
    }
}

/// Machine-readable form of a [`BatchResult`].
#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub passed: usize,
    pub failed: usize,
    pub files: Vec<JsonFile>,
}

#[derive(Debug, Serialize)]
pub struct JsonFile {
    pub path: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JsonFile {
    fn from_report(report: &FileReport) -> Self {
        let path = report.path.display().to_string();
        match &report.outcome {
            Outcome::Checked(Verdict::Equivalent) => Self {
                path,
                status: "equivalent",
                error_kind: None,
                message: None,
            },
            Outcome::Checked(Verdict::Divergent(_)) => Self {
                path,
                status: "divergent",
                error_kind: None,
                message: None,
            },
            Outcome::Errored(err) => Self {
                path,
                status: "error",
                error_kind: Some(format!("{:?}", err.kind())),
                message: Some(err.to_string()),
            },
        }
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Presentation switches for per-file reports.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Print both canonical forms before the diff of a divergent file.
    pub show_canonical: bool,
}

/// Reads one fixture, formats it and compares the two texts.
pub fn check_file<F: Formatter + ?Sized>(path: &Path, formatter: &F) -> Outcome {
    let original = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) => {
            return Outcome::Errored(HarnessError::FileUnreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    match formatter.format(path) {
        Ok(formatted) => Outcome::Checked(evaluate(&original, &formatted)),
        Err(err) => Outcome::Errored(err),
    }
}

/// Checks every file in order, streaming each verdict to `sink` as soon as it
/// is known. Never stops early.
pub fn run_batch<F, S>(
    files: &[PathBuf],
    formatter: &F,
    sink: &mut S,
    options: &ReportOptions,
) -> BatchResult
where
    F: Formatter + ?Sized,
    S: OutputSink + ?Sized,
{
    let mut result = BatchResult::new();
    for path in files {
        sink.emit(&format!("Testing {}... ", path.display()), Tone::Plain);
        let outcome = check_file(path, formatter);
        debug!(file = %path.display(), passed = matches!(outcome, Outcome::Checked(Verdict::Equivalent)), "checked");
        report_outcome(&outcome, sink, options);
        result.record(FileReport {
            path: path.clone(),
            outcome,
        });
    }
    result
}

// =============================================================================
// REPORTING
// =============================================================================

/// Finishes the `Testing <file>... ` line and prints any details after it.
pub fn report_outcome<S: OutputSink + ?Sized>(
    outcome: &Outcome,
    sink: &mut S,
    options: &ReportOptions,
) {
    match outcome {
        Outcome::Checked(Verdict::Equivalent) => {
            sink.line("SUCCESS (equivalent)", Tone::Success);
        }
        Outcome::Checked(Verdict::Divergent(divergence)) => {
            sink.line(
                "FAILURE (content differs even when normalized)",
                Tone::Failure,
            );
            if options.show_canonical {
                sink.line(
                    &format!("canonical original:  {}", divergence.original),
                    Tone::Plain,
                );
                sink.line(
                    &format!("canonical formatted: {}", divergence.formatted),
                    Tone::Plain,
                );
            }
            print_diff(&divergence.diff, sink);
        }
        Outcome::Errored(err) => print_error_outcome(err, sink),
    }
}

fn print_error_outcome<S: OutputSink + ?Sized>(err: &HarnessError, sink: &mut S) {
    match err.kind() {
        ErrorKind::FileUnreadable => sink.line(&format!("ERROR ({err})"), Tone::Failure),
        _ => sink.line(&format!("FAILURE ({err})"), Tone::Failure),
    }
    if let Some(stderr) = err.captured_stderr() {
        sink.emit(stderr, Tone::Plain);
        if !stderr.ends_with('\n') {
            sink.emit("\n", Tone::Plain);
        }
    }
}

/// Prints a unified diff with colored change lines.
pub fn print_diff<S: OutputSink + ?Sized>(diff: &DiffReport, sink: &mut S) {
    if diff.is_empty() {
        return;
    }
    sink.line(&format!("--- {}", diff.original_label), Tone::Emphasis);
    sink.line(&format!("+++ {}", diff.formatted_label), Tone::Emphasis);
    for hunk in &diff.hunks {
        sink.line(&hunk.header(), Tone::HunkHeader);
        for line in &hunk.lines {
            let tone = match line {
                DiffLine::Context(_) => Tone::Plain,
                DiffLine::Removed(_) => Tone::Removed,
                DiffLine::Added(_) => Tone::Added,
            };
            sink.line(&line.to_string(), tone);
        }
    }
}

/// Prints the closing pass/fail counts.
pub fn report_summary<S: OutputSink + ?Sized>(result: &BatchResult, sink: &mut S) {
    sink.emit("\n", Tone::Plain);
    sink.line(&"-".repeat(50), Tone::Plain);
    sink.emit("Test Summary: ", Tone::Emphasis);
    sink.emit(
        &format!("{} passed", result.passed()),
        if result.passed() > 0 {
            Tone::Success
        } else {
            Tone::Plain
        },
    );
    sink.emit(", ", Tone::Plain);
    sink.line(
        &format!("{} failed", result.failed()),
        if result.failed() > 0 {
            Tone::Failure
        } else {
            Tone::Plain
        },
    );
}
