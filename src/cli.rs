//! CLI command implementations for Brine.

pub(crate) mod genmap;
pub(crate) mod replay;
pub(crate) mod run;

use std::error::Error;
use std::fmt;

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<brine::MapError> for CliError {
    fn from(e: brine::MapError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<brine::ReplayError> for CliError {
    fn from(e: brine::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}
