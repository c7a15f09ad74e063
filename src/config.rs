//! Harness configuration.
//!
//! Settings are layered: [`HarnessConfig::default`] first, then an optional
//! YAML file, then command-line flags. The driver receives the resolved
//! [`HarnessConfig`] and never reads ambient state itself.
//!
//! ```yaml
//! executable_to_test: ../../prpfmt
//! fixture_dir: ../full_pyrope
//! fixture_extension: prp
//! timeout_secs: 30
//! show_canonical: false
//! ```

use crate::errors::HarnessError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_EXECUTABLE: &str = "../../prpfmt";
pub const DEFAULT_FIXTURE_DIR: &str = "../full_pyrope";
pub const DEFAULT_EXTENSION: &str = "prp";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the driver needs to run a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub executable_to_test: PathBuf,
    pub fixture_dir: PathBuf,
    /// Extension without the leading dot.
    pub fixture_extension: String,
    pub timeout: Duration,
    pub use_colors: bool,
    /// Print both canonical forms when a file diverges.
    pub show_canonical: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            executable_to_test: PathBuf::from(DEFAULT_EXECUTABLE),
            fixture_dir: PathBuf::from(DEFAULT_FIXTURE_DIR),
            fixture_extension: DEFAULT_EXTENSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_colors: atty::is(atty::Stream::Stdout),
            show_canonical: false,
        }
    }
}

impl HarnessConfig {
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_to_test = path.into();
        self
    }

    pub fn with_fixture_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixture_dir = path.into();
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.fixture_extension = normalize_extension(extension);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overlays the values present in a config file.
    pub fn apply_file(mut self, file: ConfigFile) -> Self {
        if let Some(path) = file.executable_to_test {
            self.executable_to_test = path;
        }
        if let Some(path) = file.fixture_dir {
            self.fixture_dir = path;
        }
        if let Some(ext) = file.fixture_extension {
            self.fixture_extension = normalize_extension(&ext);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(show) = file.show_canonical {
            self.show_canonical = show;
        }
        self
    }

    /// Checks the preconditions of a run: a non-zero timeout, the formatter
    /// exists and the fixture directory is a directory.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.timeout.is_zero() {
            return Err(HarnessError::ZeroTimeout);
        }
        if !self.executable_to_test.exists() {
            return Err(HarnessError::MissingExecutable {
                path: self.executable_to_test.clone(),
            });
        }
        if !self.fixture_dir.is_dir() {
            return Err(HarnessError::MissingFixtureDir {
                path: self.fixture_dir.clone(),
            });
        }
        Ok(())
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

/// On-disk configuration. Every key is optional; unknown keys are rejected so
/// that typos do not silently fall back to defaults.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub executable_to_test: Option<PathBuf>,
    pub fixture_dir: Option<PathBuf>,
    pub fixture_extension: Option<String>,
    pub timeout_secs: Option<u64>,
    pub show_canonical: Option<bool>,
}

impl ConfigFile {
    /// Reads a YAML config file. Relative paths inside it are resolved
    /// against the file's own directory.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let content = fs::read_to_string(path).map_err(|source| HarnessError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = Self::parse(&content).map_err(|source| HarnessError::ConfigInvalid {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            file.executable_to_test = file.executable_to_test.map(|p| resolve(base, p));
            file.fixture_dir = file.fixture_dir.map(|p| resolve(base, p));
        }
        Ok(file)
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
