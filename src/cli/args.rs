//! Defines the command-line arguments and subcommands for the fmtequiv CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "fmtequiv",
    version,
    about = "Checks that a source formatter only changes layout, comments and terminators."
)]
pub struct FmtEquivArgs {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the formatter over every fixture and compare canonical forms.
    Check(CheckArgs),
    /// Print the canonical form of a file.
    Canonicalize {
        /// The file to canonicalize.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Compare two files directly, without running a formatter.
    Compare {
        /// The original text.
        #[arg(required = true)]
        original: PathBuf,
        /// The formatted text.
        #[arg(required = true)]
        formatted: PathBuf,
        /// Print both canonical forms when the files diverge.
        #[arg(long)]
        show_canonical: bool,
        /// Disable colored output.
        #[arg(long)]
        no_color: bool,
    },
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// YAML config file; flags given here override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Path to the formatter executable under test.
    #[arg(long, value_name = "PATH")]
    pub formatter: Option<PathBuf>,
    /// Directory holding the fixtures (not searched recursively).
    #[arg(long, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,
    /// Fixture file extension, with or without the leading dot.
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,
    /// Seconds to wait for the formatter on each file.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
    /// Print both canonical forms when a file diverges.
    #[arg(long)]
    pub show_canonical: bool,
    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
    /// Also write a JSON summary of the run to this file.
    #[arg(long, value_name = "FILE")]
    pub json_summary: Option<PathBuf>,
}
