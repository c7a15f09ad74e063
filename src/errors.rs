//! Errors raised while checking a formatter.
//!
//! Every failure is a [`HarnessError`]. Its [`ErrorKind`] decides how the
//! batch reacts: configuration problems abort the run before any file is
//! compared, everything else is recorded against the file it happened on and
//! the batch moves on.

use miette::Diagnostic;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification used by the batch runner and the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing executable, missing fixture directory, bad config file or
    /// an unwritable summary path.
    ConfigurationInvalid,
    /// A discovered fixture could not be read or decoded.
    FileUnreadable,
    /// The formatter could not be launched, exited non-zero, or wrote garbage.
    FormatterInvocationFailed,
    /// The formatter did not exit within the configured bound.
    FormatterTimeout,
}

impl ErrorKind {
    /// Only configuration errors stop the whole run.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::ConfigurationInvalid)
    }
}

#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    #[error("formatter executable not found at {}", path.display())]
    #[diagnostic(
        code(fmtequiv::config::missing_executable),
        help("build the formatter first, or pass its location with --formatter")
    )]
    MissingExecutable { path: PathBuf },

    #[error("fixture directory not found at {}", path.display())]
    #[diagnostic(
        code(fmtequiv::config::missing_fixture_dir),
        help("pass an existing directory with --fixtures")
    )]
    MissingFixtureDir { path: PathBuf },

    #[error("could not read config file {}", path.display())]
    #[diagnostic(code(fmtequiv::config::unreadable))]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    #[diagnostic(
        code(fmtequiv::config::invalid),
        help("recognized keys: executable_to_test, fixture_dir, fixture_extension, timeout_secs, show_canonical")
    )]
    ConfigInvalid {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("formatter timeout must be at least one second")]
    #[diagnostic(
        code(fmtequiv::config::zero_timeout),
        help("set timeout_secs to 1 or more")
    )]
    ZeroTimeout,

    #[error("could not write JSON summary to {}", path.display())]
    #[diagnostic(code(fmtequiv::config::summary_write))]
    SummaryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan fixture directory {}", path.display())]
    #[diagnostic(code(fmtequiv::config::discovery))]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("could not read file {}: {source}", path.display())]
    #[diagnostic(code(fmtequiv::file::unreadable))]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not launch formatter {}: {source}", executable.display())]
    #[diagnostic(code(fmtequiv::formatter::launch))]
    FormatterLaunch {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", exit_description(*code))]
    #[diagnostic(code(fmtequiv::formatter::exit_status))]
    FormatterExit { code: Option<i32>, stderr: String },

    #[error("formatter output is not valid UTF-8")]
    #[diagnostic(code(fmtequiv::formatter::output))]
    FormatterOutput {
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("formatter timed out after {}s", timeout.as_secs_f64())]
    #[diagnostic(
        code(fmtequiv::formatter::timeout),
        help("raise the bound with --timeout-secs if the formatter is just slow")
    )]
    FormatterTimeout { timeout: Duration },
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("formatter exited with code {code}"),
        None => "formatter was terminated by a signal".to_string(),
    }
}

impl HarnessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarnessError::MissingExecutable { .. }
            | HarnessError::MissingFixtureDir { .. }
            | HarnessError::ConfigUnreadable { .. }
            | HarnessError::ConfigInvalid { .. }
            | HarnessError::ZeroTimeout
            | HarnessError::SummaryWrite { .. }
            | HarnessError::Discovery { .. } => ErrorKind::ConfigurationInvalid,
            HarnessError::FileUnreadable { .. } => ErrorKind::FileUnreadable,
            HarnessError::FormatterLaunch { .. }
            | HarnessError::FormatterExit { .. }
            | HarnessError::FormatterOutput { .. } => ErrorKind::FormatterInvocationFailed,
            HarnessError::FormatterTimeout { .. } => ErrorKind::FormatterTimeout,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }

    /// Diagnostic stream captured from the formatter, when there is one.
    pub fn captured_stderr(&self) -> Option<&str> {
        match self {
            HarnessError::FormatterExit { stderr, .. } if !stderr.trim().is_empty() => {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }
}

/// Renders a fatal error through miette on stderr.
pub fn print_error(error: HarnessError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
