//! Run configuration, built once at startup.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{CutxError, CutxResult};

pub const DEFAULT_DELIMITER: &str = "\t";
pub const DEFAULT_FIELDS: &str = "1-";

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Literal field separator for both input and output.
    pub delimiter: String,
    /// Unparsed field list.
    pub fields: String,
    /// Input file; `None` or `-` reads standard input.
    pub input: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            fields: DEFAULT_FIELDS.to_string(),
            input: None,
        }
    }
}

impl Config {
    pub fn new(delimiter: impl Into<String>, fields: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            fields: fields.into(),
            input: None,
        }
    }

    pub fn with_input(mut self, input: Option<PathBuf>) -> Self {
        self.input = input;
        self
    }

    /// Check settings that would otherwise fail only once input arrives.
    pub fn validate(&self) -> CutxResult<()> {
        if self.delimiter.is_empty() {
            return Err(CutxError::EmptyDelimiter);
        }
        Ok(())
    }

    /// The input file, unless standard input was requested.
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|p| *p != Path::new("-"))
    }

    /// Open the configured input for line-by-line reading.
    pub fn open_input(&self) -> CutxResult<Box<dyn BufRead>> {
        match self.input_path() {
            Some(path) => {
                let file = File::open(path).map_err(|source| CutxError::OpenInput {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => Ok(Box::new(io::stdin().lock())),
        }
    }
}
