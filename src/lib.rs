//! # cutx
//!
//! `cut` for delimited text, with an optional command per field.
//!
//! Each line is split on a literal delimiter. A field list such as
//! `1,2=date -d@{},4-` selects fields in order; a field with `=<command>` is
//! replaced by the trimmed standard output of `<command>` run through
//! `sh -c`, with `{}` substituted by the field value.
//! Lines are handled as raw bytes and need not be UTF-8.
//!
//! ## Example
//!
//! ```
//! use cutx::{LineProcessor, ShellRunner, parse_field_spec};
//!
//! let mappers = parse_field_spec("3,1").unwrap();
//! let processor = LineProcessor::new(&mappers, ",", &ShellRunner);
//!
//! assert_eq!(processor.process_line(b"a,b,c\n"), b"c,a");
//! ```

pub mod config;
pub mod error;
pub mod field_spec;
pub mod processor;
pub mod transform;

use std::io::Write;

use tracing::debug;

pub use config::{Config, DEFAULT_DELIMITER, DEFAULT_FIELDS};
pub use error::{CutxError, CutxResult, TransformError};
pub use field_spec::{FieldEnd, FieldMapper, parse_field_spec};
pub use processor::{LineProcessor, ProcessStats};
pub use transform::{CommandRunner, PLACEHOLDER, ShellRunner, render_command, transform_field};

/// Run a whole job: validate `config`, parse the field list, then stream the
/// configured input to `output`.
///
/// Configuration errors are reported before the input is opened.
pub fn run<R: CommandRunner, W: Write>(
    config: &Config,
    runner: &R,
    output: W,
) -> CutxResult<ProcessStats> {
    config.validate()?;
    let mappers = parse_field_spec(&config.fields)?;
    for mapper in &mappers {
        debug!(%mapper, "field mapper");
    }

    let input = config.open_input()?;
    LineProcessor::new(&mappers, &config.delimiter, runner).process_stream(input, output)
}
