//! Output sinks for streamed harness reports.
//!
//! The reporter writes every line through an [`OutputSink`] as soon as it is
//! known. [`StdoutSink`] colors and flushes to the terminal; [`OutputBuffer`]
//! collects plain text for tests and programmatic callers.

use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::warn;

/// How a piece of output should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Success,
    Failure,
    Removed,
    Added,
    HunkHeader,
    Emphasis,
}

impl Tone {
    fn color_spec(self) -> Option<ColorSpec> {
        let mut spec = ColorSpec::new();
        match self {
            Tone::Plain => return None,
            Tone::Success => spec.set_fg(Some(Color::Green)).set_bold(true),
            Tone::Failure => spec.set_fg(Some(Color::Red)).set_bold(true),
            Tone::Removed => spec.set_fg(Some(Color::Red)),
            Tone::Added => spec.set_fg(Some(Color::Green)),
            Tone::HunkHeader => spec.set_fg(Some(Color::Cyan)),
            Tone::Emphasis => spec.set_bold(true),
        };
        Some(spec)
    }
}

/// Receives report text. Callers include their own newlines.
pub trait OutputSink {
    fn emit(&mut self, text: &str, tone: Tone);

    fn line(&mut self, text: &str, tone: Tone) {
        self.emit(text, tone);
        self.emit("\n", Tone::Plain);
    }
}

/// OutputBuffer: collects output into a String, dropping tone.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    pub buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str, _tone: Tone) {
        self.buffer.push_str(text);
    }
}

/// TermSink: writes to a color-capable stream, flushing after every piece so
/// long batches show progress. Write errors never stop the batch; the first
/// one is logged and later ones are counted silently.
pub struct TermSink<W: WriteColor> {
    stream: W,
    write_failed: bool,
}

/// The sink the CLI reports through.
pub type StdoutSink = TermSink<StandardStream>;

impl TermSink<StandardStream> {
    pub fn new(use_colors: bool) -> Self {
        let choice = if use_colors {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Self::with_stream(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> TermSink<W> {
    pub fn with_stream(stream: W) -> Self {
        Self {
            stream,
            write_failed: false,
        }
    }

    /// True once any write to the stream has failed.
    pub fn write_failed(&self) -> bool {
        self.write_failed
    }

    fn write_piece(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        match tone.color_spec() {
            Some(spec) => {
                self.stream.set_color(&spec)?;
                self.stream.write_all(text.as_bytes())?;
                self.stream.reset()?;
            }
            None => self.stream.write_all(text.as_bytes())?,
        }
        self.stream.flush()
    }
}

impl<W: WriteColor> OutputSink for TermSink<W> {
    fn emit(&mut self, text: &str, tone: Tone) {
        if let Err(err) = self.write_piece(text, tone) {
            if !self.write_failed {
                warn!(error = %err, "could not write report output");
            }
            self.write_failed = true;
        }
    }
}
