//! The fmtequiv Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands: it resolves
//! configuration, wires the formatter and output sink together, and turns the
//! batch outcome into the process exit code.

use std::path::Path;
use std::time::Duration;
use std::{fs, process};

use clap::Parser;
use tracing::{debug, info, Level};

use crate::canonical::canonicalize;
use crate::cli::args::{CheckArgs, Command, FmtEquivArgs};
use crate::config::{ConfigFile, HarnessConfig};
use crate::discovery::FixtureDiscoverer;
use crate::errors::{print_error, HarnessError};
use crate::formatter::ExternalFormatter;
use crate::harness::{
    evaluate, report_outcome, report_summary, run_batch, JsonSummary, Outcome, ReportOptions,
};
use crate::output::{OutputSink, StdoutSink, Tone};

pub mod args;

/// The main entry point for the CLI.
pub fn run() {
    let args = FmtEquivArgs::parse();
    init_logging(args.verbose);

    let code = match args.command {
        Command::Check(check) => run_check(check),
        Command::Canonicalize { file } => run_canonicalize(&file),
        Command::Compare {
            original,
            formatted,
            show_canonical,
            no_color,
        } => run_compare(&original, &formatted, show_canonical, !no_color),
    };
    process::exit(code);
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Layers defaults, the optional config file and the flags.
pub fn resolve_config(args: &CheckArgs) -> Result<HarnessConfig, HarnessError> {
    let mut config = HarnessConfig::default();
    if let Some(path) = &args.config {
        debug!(config = %path.display(), "loading config file");
        config = config.apply_file(ConfigFile::load(path)?);
    }
    if let Some(path) = &args.formatter {
        config = config.with_executable(path);
    }
    if let Some(dir) = &args.fixtures {
        config = config.with_fixture_dir(dir);
    }
    if let Some(ext) = &args.extension {
        config = config.with_extension(ext);
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if args.show_canonical {
        config.show_canonical = true;
    }
    if args.no_color {
        config.use_colors = false;
    }
    Ok(config)
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

fn run_check(args: CheckArgs) -> i32 {
    let config = match resolve_config(&args).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            print_error(e);
            return 1;
        }
    };
    info!(
        formatter = %config.executable_to_test.display(),
        fixtures = %config.fixture_dir.display(),
        extension = %config.fixture_extension,
        "starting check"
    );

    let files = match FixtureDiscoverer::discover_fixture_files(
        &config.fixture_dir,
        &config.fixture_extension,
    ) {
        Ok(files) => files,
        Err(e) => {
            print_error(e);
            return 1;
        }
    };

    let formatter = ExternalFormatter::new(&config.executable_to_test, config.timeout);
    let options = ReportOptions {
        show_canonical: config.show_canonical,
    };
    let mut sink = StdoutSink::new(config.use_colors);
    let result = run_batch(&files, &formatter, &mut sink, &options);
    report_summary(&result, &mut sink);

    if let Some(path) = &args.json_summary {
        if let Err(e) = write_json_summary(path, &result.summary()) {
            print_error(e);
            return 1;
        }
    }
    result.exit_code()
}

fn run_canonicalize(file: &Path) -> i32 {
    match read_source(file) {
        Ok(text) => {
            println!("{}", canonicalize(&text));
            0
        }
        Err(e) => {
            print_error(e);
            1
        }
    }
}

fn run_compare(original: &Path, formatted: &Path, show_canonical: bool, use_colors: bool) -> i32 {
    let texts = read_source(original).and_then(|o| Ok((o, read_source(formatted)?)));
    let (original_text, formatted_text) = match texts {
        Ok(texts) => texts,
        Err(e) => {
            print_error(e);
            return 1;
        }
    };

    let verdict = evaluate(&original_text, &formatted_text);
    let passed = verdict.is_equivalent();
    let mut sink = StdoutSink::new(use_colors && atty::is(atty::Stream::Stdout));
    sink.emit(
        &format!("Comparing {} with {}... ", original.display(), formatted.display()),
        Tone::Plain,
    );
    report_outcome(
        &Outcome::Checked(verdict),
        &mut sink,
        &ReportOptions { show_canonical },
    );
    if passed {
        0
    } else {
        1
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn read_source(path: &Path) -> Result<String, HarnessError> {
    fs::read_to_string(path).map_err(|source| HarnessError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json_summary(path: &Path, summary: &JsonSummary) -> Result<(), HarnessError> {
    let summary_error = |source: std::io::Error| HarnessError::SummaryWrite {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| summary_error(std::io::Error::from(e)))?;
    fs::write(path, json + "\n").map_err(summary_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::BatchResult;
    use std::path::PathBuf;

    fn check_args(argv: &[&str]) -> CheckArgs {
        let mut full = vec!["fmtequiv", "check"];
        full.extend_from_slice(argv);
        match FmtEquivArgs::parse_from(full).command {
            Command::Check(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_override_defaults() {
        let args = check_args(&[
            "--formatter",
            "/bin/fmt",
            "--fixtures",
            "fx",
            "--extension",
            ".pyr",
            "--timeout-secs",
            "4",
            "--show-canonical",
            "--no-color",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.executable_to_test, PathBuf::from("/bin/fmt"));
        assert_eq!(config.fixture_dir, PathBuf::from("fx"));
        assert_eq!(config.fixture_extension, "pyr");
        assert_eq!(config.timeout, Duration::from_secs(4));
        assert!(config.show_canonical);
        assert!(!config.use_colors);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("fmtequiv.yaml");
        fs::write(
            &config_path,
            "executable_to_test: bin/prpfmt\nfixture_dir: fixtures\ntimeout_secs: 9\n",
        )
        .unwrap();
        let args = check_args(&[
            "--config",
            config_path.to_str().unwrap(),
            "--timeout-secs",
            "2",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.executable_to_test, dir.path().join("bin/prpfmt"));
        assert_eq!(config.fixture_dir, dir.path().join("fixtures"));
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let parsed = FmtEquivArgs::try_parse_from(["fmtequiv", "check", "--timeout-secs", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unwritable_summary_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("summary.json");
        let err = write_json_summary(&path, &BatchResult::new().summary()).unwrap_err();
        assert!(matches!(err, HarnessError::SummaryWrite { .. }));
        assert!(err.to_string().contains("could not write JSON summary"));
    }

    #[test]
    fn missing_config_file_is_fatal() {
        let args = check_args(&["--config", "/no/such/fmtequiv.yaml"]);
        let err = resolve_config(&args).unwrap_err();
        assert!(err.is_fatal());
    }
}
