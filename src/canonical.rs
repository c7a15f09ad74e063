//! Canonical forms for formatter equivalence checks.
//!
//! Two texts are considered equivalent when their canonical forms are
//! identical. The canonical form is produced by three passes, applied in
//! order:
//!
//! 1. **Comments**: everything from `//` to the end of its line is removed.
//!    Block comments are not recognized, and a `//` inside a string literal
//!    is treated like any other comment marker.
//! 2. **Terminators**: every `;` is removed, wherever it appears.
//! 3. **Whitespace**: every run of whitespace is deleted outright (not
//!    collapsed to a single space).
//!
//! This is a lexical check only. Reordered statements, renamed identifiers
//! or rewritten literals all produce different canonical forms.
//!
//! # Known limitations
//!
//! - `//` inside a string literal starts a comment like anywhere else.
//! - The pipeline is idempotent only when its output contains no `//`.
//!   Deleting terminators and whitespace can join two slashes (`a / /b`
//!   becomes `a//b`), and canonicalizing that result again strips the new
//!   "comment". Comparisons always canonicalize raw text exactly once, so
//!   verdicts are unaffected.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Line comment marker. The regex `.` stops at `\n`, so only the rest of the
/// current line is consumed.
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//.*").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Statement terminator stripped from the canonical form.
pub const TERMINATOR: char = ';';

/// Text with comments, terminators and whitespace removed.
///
/// Only [`canonicalize`] builds one, so holding a `CanonicalForm` means the
/// string has already been through the full pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CanonicalForm(String);

impl CanonicalForm {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalForm {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reduces `text` to its canonical form. Never fails.
pub fn canonicalize(text: &str) -> CanonicalForm {
    let without_comments = LINE_COMMENT.replace_all(text, "");
    let without_terminators = without_comments.replace(TERMINATOR, "");
    let dense = WHITESPACE.replace_all(&without_terminators, "");
    CanonicalForm(dense.into_owned())
}

/// Returns true when both texts share a canonical form.
pub fn equivalent(original: &str, formatted: &str) -> bool {
    canonicalize(original) == canonicalize(formatted)
}
