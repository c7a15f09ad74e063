//! # fmtequiv test fixtures
//!
//! Builds throwaway fixture directories and stub formatter scripts. The stubs
//! are POSIX shell scripts, so the tests that run them are unix-only.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PROGRAM: &str = "a = 1;\nb = a + 2; // add\nc = b * 3;\n";

/// Reformats whitespace only: drops indentation and squeezes runs of spaces.
pub const WHITESPACE_ONLY: &str = "#!/bin/sh\nsed -e 's/^[[:space:]]*//' -e 's/  */ /g' \"$1\"\n";
/// Loses every statement that starts with `b =`.
pub const DROPS_STATEMENT: &str = "#!/bin/sh\nsed -e '/^b =/d' \"$1\"\n";
/// Fails the way a formatter rejecting its input would.
pub const REJECTS_INPUT: &str = "#!/bin/sh\necho \"parse error in $1\" >&2\nexit 3\n";
/// Writes a byte that is never valid UTF-8.
pub const EMITS_INVALID_UTF8: &str = "#!/bin/sh\nprintf '\\377'\n";
/// Exits at once but leaves a background process holding stdout.
pub const LEAVES_PIPE_OPEN: &str = "#!/bin/sh\nsleep 5 &\ncat \"$1\"\n";
/// Never finishes within a short timeout.
pub const HANGS: &str = "#!/bin/sh\nexec sleep 30\n";

/// A fixture directory plus a place for stub formatters, both cleaned up on drop.
pub struct Workspace {
    root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        fs::create_dir(root.path().join("fixtures")).expect("create fixture dir");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn fixture_dir(&self) -> PathBuf {
        self.root.path().join("fixtures")
    }

    pub fn fixture(&self, name: &str, content: &str) -> PathBuf {
        let path = self.fixture_dir().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn fixture_bytes(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.fixture_dir().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    /// Writes an executable script and returns its path.
    #[cfg(unix)]
    pub fn stub_formatter(&self, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root.path().join(name);
        fs::write(&path, script).expect("write stub formatter");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("make stub executable");
        path
    }
}
