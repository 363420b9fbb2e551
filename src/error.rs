//! Error categories for the import and query engine.
//!
//! Configuration errors are the user's to fix and carry an optional hint.
//! Upstream errors wrap a collaborator failure with enough context to locate
//! it (the operation name, or the CSV row for record creation). The cause is
//! part of the message rather than the source chain, so `{:#}` prints it once.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input or configuration; retrying without changes will not help.
    #[error("{message}")]
    Config {
        message: String,
        hint: Option<String>,
    },

    /// A collaborator call (schema fetch, page fetch) failed.
    #[error("{operation} failed: {cause:#}")]
    Upstream {
        operation: String,
        cause: anyhow::Error,
    },

    /// Record creation failed for the given 1-based CSV row.
    #[error("creating record for row {row} failed: {cause:#}")]
    RecordCreation { row: usize, cause: anyhow::Error },
}

impl Error {
    pub fn config(message: impl fmt::Display) -> Self {
        Error::Config {
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn config_with_hint(message: impl fmt::Display, hint: impl fmt::Display) -> Self {
        Error::Config {
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    pub fn upstream(operation: impl fmt::Display, cause: anyhow::Error) -> Self {
        Error::Upstream {
            operation: operation.to_string(),
            cause,
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::Config { .. })
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Error::Config { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}
