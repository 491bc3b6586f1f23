//! Error types for field-spec parsing and line processing.
//!
//! - [`CutxError`] - fatal configuration and I/O errors, returned to the entry point
//! - [`TransformError`] - per-field command failures, recovered inside the processor

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors. Any of these ends the run.
#[derive(Debug, Error)]
pub enum CutxError {
    /// A token of the field list does not match `<index-or-range>[=<command>]`.
    #[error("Unable to parse field list {spec:?}: {token:?} is not a field index or range")]
    InvalidToken { spec: String, token: String },

    /// More than one dash in the index part of a token.
    #[error("Invalid field list {spec:?}: {range:?} should either be a number or a single range")]
    MultipleRanges { spec: String, range: String },

    /// An index bound is not an integer.
    #[error("Unable to convert {value:?} into an integer: {source}")]
    InvalidIndex {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Fields are numbered from 1.
    #[error("Invalid field list {spec:?}: fields are numbered from 1")]
    ZeroIndex { spec: String },

    /// The delimiter must be at least one character.
    #[error("Delimiter must not be empty")]
    EmptyDelimiter,

    /// The input file could not be opened.
    #[error("Unable to open file {}: {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading a line failed for a reason other than end of input.
    #[error("Error while reading line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },

    /// Writing output failed.
    #[error("Error while writing output: {0}")]
    Write(#[source] io::Error),
}

impl CutxError {
    /// True for errors raised before any input is read.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CutxError::InvalidToken { .. }
                | CutxError::MultipleRanges { .. }
                | CutxError::InvalidIndex { .. }
                | CutxError::ZeroIndex { .. }
                | CutxError::EmptyDelimiter
        )
    }
}

/// Failure of a single field transform command.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The interpreter could not be started.
    #[error("failed to launch: {0}")]
    Launch(#[from] io::Error),

    /// The command ran but did not succeed. `stderr` is its captured,
    /// trimmed standard error.
    #[error("exited with {status}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Result type for fatal operations.
pub type CutxResult<T> = Result<T, CutxError>;
