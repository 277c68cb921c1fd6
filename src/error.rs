//! Crate-wide error type.
//!
//! The variants follow the pipeline's error taxonomy:
//!
//! - `InvalidArgument` — malformed dates, unsupported regions, bad options.
//!   Raised synchronously, never recovered.
//! - `EmptyInput` — a required input (date list, trend table, peak map) is
//!   absent or empty. Same treatment as `InvalidArgument`.
//! - `Fetch` — a remote resource is missing or unreachable. Non-fatal at the
//!   assembly level: the caller logs it and skips the affected date.
//!
//! The remaining variants wrap I/O, CSV, HTTP, and rendering failures from the
//! libraries we build on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("fetch failed for {resource}: {reason}")]
    Fetch { resource: String, reason: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chart rendering failed: {0}")]
    Render(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyInput(message.into())
    }

    pub fn fetch(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for the binary.
    ///
    /// 2 = invalid usage/arguments, 3 = empty input/data, 4 = fetch/data errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => 2,
            Self::EmptyInput(_) => 3,
            _ => 4,
        }
    }
}
