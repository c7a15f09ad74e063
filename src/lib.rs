pub use crate::canonical::{canonicalize, equivalent, CanonicalForm};
pub use crate::errors::{ErrorKind, HarnessError};
pub use crate::harness::{evaluate, BatchResult, Verdict};

pub mod canonical;
pub mod cli;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod errors;
pub mod formatter;
pub mod harness;
pub mod output;
