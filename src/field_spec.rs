//! Field list parser.
//!
//! A field list is a comma-separated sequence of tokens:
//! ```text
//! 1,3-4,6-        plain selection, like cut -f
//! 1=date -d@{},2  field 1 replaced by the output of `date -d@<field>`
//! ```
//!
//! - `N` selects field N
//! - `N-M` selects fields N through M
//! - `N-` selects field N through the last field of each line
//! - `=<command>` runs `<command>` with `{}` replaced by the field value and
//!   emits its trimmed output instead of the field
//!
//! Fields are numbered from 1 in the list and from 0 in [`FieldMapper`].

use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CutxError, CutxResult};

/// Everything after the first `=` is the command, newlines included.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([0-9-]+)(?:=(.*))?$").expect("token pattern is valid"));

/// Upper bound of a field range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEnd {
    /// Last selected index, zero-based and inclusive.
    Bounded(usize),
    /// Through the last field of the current line.
    OpenEnded,
}

/// One parsed token of the field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapper {
    start: usize,
    end: FieldEnd,
    command: String,
}

impl FieldMapper {
    pub fn new(start: usize, end: FieldEnd, command: impl Into<String>) -> Self {
        Self {
            start,
            end,
            command: command.into(),
        }
    }

    /// Zero-based first index.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> FieldEnd {
        self.end
    }

    /// Command template, empty for pass-through.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_passthrough(&self) -> bool {
        self.command.is_empty()
    }

    /// Indices selected on a line with `field_count` fields.
    ///
    /// Indices past the end of the line are dropped, and a range whose end
    /// precedes its start selects nothing.
    pub fn indices(&self, field_count: usize) -> Range<usize> {
        let stop = match self.end {
            FieldEnd::Bounded(end) => end.saturating_add(1).min(field_count),
            FieldEnd::OpenEnded => field_count,
        };
        self.start..stop.max(self.start)
    }
}

impl fmt::Display for FieldMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start + 1)?;
        match self.end {
            FieldEnd::Bounded(end) if end == self.start => {}
            FieldEnd::Bounded(end) => write!(f, "-{}", end + 1)?,
            FieldEnd::OpenEnded => write!(f, "-")?,
        }
        if !self.command.is_empty() {
            write!(f, "={}", self.command)?;
        }
        Ok(())
    }
}

/// Parse a field list into mappers, preserving token order.
pub fn parse_field_spec(spec: &str) -> CutxResult<Vec<FieldMapper>> {
    spec.split(',')
        .map(|token| parse_token(spec, token))
        .collect()
}

/// Parse a single `<index-or-range>[=<command>]` token.
fn parse_token(spec: &str, token: &str) -> CutxResult<FieldMapper> {
    let caps = TOKEN_RE
        .captures(token)
        .ok_or_else(|| CutxError::InvalidToken {
            spec: spec.to_string(),
            token: token.to_string(),
        })?;

    let range = caps.get(1).map_or("", |m| m.as_str());
    let command = caps.get(2).map_or("", |m| m.as_str());

    let bounds: Vec<&str> = range.split('-').collect();
    if bounds.len() > 2 {
        return Err(CutxError::MultipleRanges {
            spec: spec.to_string(),
            range: range.to_string(),
        });
    }

    let start = parse_index(spec, bounds[0])?;
    let end = match bounds.get(1) {
        None => FieldEnd::Bounded(start),
        Some(&"") => FieldEnd::OpenEnded,
        Some(bound) => FieldEnd::Bounded(parse_index(spec, bound)?),
    };

    Ok(FieldMapper::new(start, end, command))
}

/// Convert a 1-based index to 0-based.
fn parse_index(spec: &str, value: &str) -> CutxResult<usize> {
    let n: usize = value.parse().map_err(|source| CutxError::InvalidIndex {
        value: value.to_string(),
        source,
    })?;
    n.checked_sub(1).ok_or_else(|| CutxError::ZeroIndex {
        spec: spec.to_string(),
    })
}
