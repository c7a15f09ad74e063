//! Running the formatter under test.
//!
//! The formatter is a black box: it receives one file path, writes the
//! formatted text to stdout, and exits 0 on success. [`Formatter`] is the seam
//! the batch runner depends on, so tests can substitute a closure.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::errors::HarnessError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Produces the formatted text for a fixture.
pub trait Formatter {
    fn format(&self, path: &Path) -> Result<String, HarnessError>;
}

impl<F> Formatter for F
where
    F: Fn(&Path) -> Result<String, HarnessError>,
{
    fn format(&self, path: &Path) -> Result<String, HarnessError> {
        self(path)
    }
}

/// An executable on disk, invoked once per file with a bounded wait.
#[derive(Debug, Clone)]
pub struct ExternalFormatter {
    executable: PathBuf,
    timeout: Duration,
}

impl ExternalFormatter {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Waits for a pipe reader until the run's deadline.
    fn collect(
        &self,
        pipe: Receiver<Vec<u8>>,
        deadline: Instant,
        path: &Path,
    ) -> Result<Vec<u8>, HarnessError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match pipe.recv_timeout(remaining) {
            Ok(buf) => Ok(buf),
            Err(RecvTimeoutError::Disconnected) => Ok(Vec::new()),
            Err(RecvTimeoutError::Timeout) => {
                warn!(file = %path.display(), timeout = ?self.timeout, "formatter output still open at deadline");
                Err(HarnessError::FormatterTimeout {
                    timeout: self.timeout,
                })
            }
        }
    }
}

impl Formatter for ExternalFormatter {
    fn format(&self, path: &Path) -> Result<String, HarnessError> {
        debug!(executable = %self.executable.display(), file = %path.display(), "spawning formatter");
        let mut child = Command::new(&self.executable)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::FormatterLaunch {
                executable: self.executable.clone(),
                source,
            })?;

        // Drain both pipes while waiting so a chatty child never blocks on a
        // full pipe buffer.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    warn!(file = %path.display(), timeout = ?self.timeout, "formatter timed out, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    // Readers are left detached: a grandchild may still hold the pipes.
                    return Err(HarnessError::FormatterTimeout {
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(HarnessError::FormatterLaunch {
                        executable: self.executable.clone(),
                        source,
                    });
                }
            }
        };

        // A grandchild can keep the pipes open after the child exits, so the
        // reads share the deadline too.
        let stdout = self.collect(stdout, deadline, path)?;
        let stderr = self.collect(stderr, deadline, path)?;
        trace!(?status, stdout_bytes = stdout.len(), stderr_bytes = stderr.len(), "formatter exited");

        if !status.success() {
            return Err(HarnessError::FormatterExit {
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            });
        }
        String::from_utf8(stdout).map_err(|source| HarnessError::FormatterOutput { source })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}
