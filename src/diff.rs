//! Line-level unified diffs between an original file and its formatted form.
//!
//! Line alignment comes from [`difference::Changeset`]; this module groups the
//! aligned lines into hunks with surrounding context, the way `diff -u` does.
//! Diffs are computed on the raw texts so that a failure report shows the
//! lines a person would actually recognize.

use difference::{Changeset, Difference};
use std::fmt;

/// Unchanged lines kept around each change.
pub const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl DiffLine {
    pub fn is_change(&self) -> bool {
        !matches!(self, DiffLine::Context(_))
    }

    pub fn prefix(&self) -> char {
        match self {
            DiffLine::Context(_) => ' ',
            DiffLine::Removed(_) => '-',
            DiffLine::Added(_) => '+',
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DiffLine::Context(s) | DiffLine::Removed(s) | DiffLine::Added(s) => s,
        }
    }

    fn in_original(&self) -> bool {
        !matches!(self, DiffLine::Added(_))
    }

    fn in_formatted(&self) -> bool {
        !matches!(self, DiffLine::Removed(_))
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), self.text())
    }
}

/// A contiguous run of changes plus their context.
///
/// `original_start` and `formatted_start` are zero-based line offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub original_start: usize,
    pub original_len: usize,
    pub formatted_start: usize,
    pub formatted_len: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// The `@@ -a,b +c,d @@` line.
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            format_range(self.original_start, self.original_len),
            format_range(self.formatted_start, self.formatted_len)
        )
    }
}

/// `diff -u` range notation: one-based start, length omitted when it is 1,
/// and an empty range anchored on the line before it.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    pub original_label: String,
    pub formatted_label: String,
    pub hunks: Vec<Hunk>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn removed_count(&self) -> usize {
        self.count(|line| matches!(line, DiffLine::Removed(_)))
    }

    pub fn added_count(&self) -> usize {
        self.count(|line| matches!(line, DiffLine::Added(_)))
    }

    fn count(&self, pred: impl Fn(&DiffLine) -> bool) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .filter(|l| pred(l))
            .count()
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hunks.is_empty() {
            return Ok(());
        }
        writeln!(f, "--- {}", self.original_label)?;
        writeln!(f, "+++ {}", self.formatted_label)?;
        for hunk in &self.hunks {
            writeln!(f, "{}", hunk.header())?;
            for line in &hunk.lines {
                writeln!(f, "{line}")?;
            }
        }
        Ok(())
    }
}

/// Diffs two texts line by line, labelled `original` and `formatted`.
pub fn unified_diff(original: &str, formatted: &str) -> DiffReport {
    unified_diff_with_labels(original, formatted, "original", "formatted")
}

pub fn unified_diff_with_labels(
    original: &str,
    formatted: &str,
    original_label: &str,
    formatted_label: &str,
) -> DiffReport {
    let lines = align_lines(original, formatted);
    DiffReport {
        original_label: original_label.to_string(),
        formatted_label: formatted_label.to_string(),
        hunks: group_hunks(&lines, CONTEXT_LINES),
    }
}

/// Produces the full aligned line sequence, context included.
fn align_lines(original: &str, formatted: &str) -> Vec<DiffLine> {
    let old: Vec<&str> = original.lines().collect();
    let new: Vec<&str> = formatted.lines().collect();

    // Changeset splits "" into a single empty line, so empty sides are
    // handled here instead.
    if old.is_empty() || new.is_empty() {
        return old
            .iter()
            .map(|l| DiffLine::Removed(l.to_string()))
            .chain(new.iter().map(|l| DiffLine::Added(l.to_string())))
            .collect();
    }

    let changeset = Changeset::new(&old.join("\n"), &new.join("\n"), "\n");
    let mut lines = Vec::new();
    for diff in changeset.diffs {
        match diff {
            Difference::Same(chunk) => {
                lines.extend(chunk.split('\n').map(|l| DiffLine::Context(l.to_string())))
            }
            Difference::Rem(chunk) => {
                lines.extend(chunk.split('\n').map(|l| DiffLine::Removed(l.to_string())))
            }
            Difference::Add(chunk) => {
                lines.extend(chunk.split('\n').map(|l| DiffLine::Added(l.to_string())))
            }
        }
    }
    lines
}

fn group_hunks(lines: &[DiffLine], context: usize) -> Vec<Hunk> {
    // Line offsets on each side before every entry.
    let mut original_at = Vec::with_capacity(lines.len() + 1);
    let mut formatted_at = Vec::with_capacity(lines.len() + 1);
    let (mut o, mut f) = (0, 0);
    for line in lines {
        original_at.push(o);
        formatted_at.push(f);
        o += usize::from(line.in_original());
        f += usize::from(line.in_formatted());
    }
    original_at.push(o);
    formatted_at.push(f);

    let mut hunks = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = lines[cursor..].iter().position(DiffLine::is_change) {
        let first_change = cursor + offset;
        let start = first_change.saturating_sub(context).max(cursor);

        // Extend over change blocks separated by short enough context runs.
        let mut end = first_change;
        loop {
            while end < lines.len() && lines[end].is_change() {
                end += 1;
            }
            let gap = lines[end..].iter().take_while(|l| !l.is_change()).count();
            if end + gap >= lines.len() || gap > 2 * context {
                break;
            }
            end += gap;
        }
        let stop = (end + context).min(lines.len());

        hunks.push(Hunk {
            original_start: original_at[start],
            original_len: original_at[stop] - original_at[start],
            formatted_start: formatted_at[start],
            formatted_len: formatted_at[stop] - formatted_at[start],
            lines: lines[start..stop].to_vec(),
        });
        cursor = stop;
    }
    hunks
}
