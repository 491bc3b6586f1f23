//! External command execution for transformed fields.
//!
//! Field values are raw bytes. They are spliced into the command line as-is
//! on Unix and lossily elsewhere.

use std::ffi::{OsStr, OsString};
use std::process::Command;

use tracing::warn;

use crate::error::TransformError;

/// Placeholder replaced by the field value in a command template.
pub const PLACEHOLDER: &str = "{}";

/// Runs a fully rendered command line and returns its standard output.
pub trait CommandRunner {
    fn run(&self, command: &OsStr) -> Result<Vec<u8>, TransformError>;
}

/// Runs commands through `sh -c`, one at a time.
///
/// Standard output and standard error are both captured. Standard error
/// only surfaces in the failure report; standard input is closed so a
/// command cannot swallow the remaining input lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &OsStr) -> Result<Vec<u8>, TransformError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(std::process::Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(TransformError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Substitute `value` for every placeholder in `template`.
pub fn render_command(template: &str, value: &[u8]) -> OsString {
    let mut rendered = Vec::with_capacity(template.len() + value.len());
    for (i, part) in template.split(PLACEHOLDER).enumerate() {
        if i > 0 {
            rendered.extend_from_slice(value);
        }
        rendered.extend_from_slice(part.as_bytes());
    }
    bytes_to_os_string(rendered)
}

#[cfg(unix)]
fn bytes_to_os_string(bytes: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(bytes)
}

#[cfg(not(unix))]
fn bytes_to_os_string(bytes: Vec<u8>) -> OsString {
    String::from_utf8_lossy(&bytes).into_owned().into()
}

/// Strip surrounding whitespace, Unicode-aware when the output is UTF-8.
fn trim_output(out: &[u8]) -> &[u8] {
    match std::str::from_utf8(out) {
        Ok(s) => s.trim().as_bytes(),
        Err(_) => out.trim_ascii(),
    }
}

/// Produce the output bytes for one field.
///
/// An empty template passes the value through. A failing command is logged
/// and yields an empty field.
pub fn transform_field<R: CommandRunner + ?Sized>(runner: &R, template: &str, value: &[u8]) -> Vec<u8> {
    if template.is_empty() {
        return value.to_vec();
    }
    let command = render_command(template, value);
    match runner.run(&command) {
        Ok(out) => trim_output(&out).to_vec(),
        Err(TransformError::Failed { status, stderr }) => {
            warn!(
                command = %command.to_string_lossy(),
                %status,
                stderr = %stderr,
                "Error while running command"
            );
            Vec::new()
        }
        Err(e) => {
            warn!(command = %command.to_string_lossy(), error = %e, "Error while running command");
            Vec::new()
        }
    }
}
