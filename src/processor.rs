//! Line-at-a-time field selection.
//!
//! Each input line is split on the delimiter, every mapper contributes the
//! fields it selects in list order, and the collected fields are joined with
//! the same delimiter. Lines are independent of each other; transform
//! commands run sequentially in output order.

use std::io::{self, BufRead, ErrorKind, Write};

use tracing::debug;

use crate::error::{CutxError, CutxResult};
use crate::field_spec::FieldMapper;
use crate::transform::{CommandRunner, transform_field};

/// Counters reported after a stream has been processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub lines: usize,
    pub fields: usize,
}

/// Applies a fixed list of mappers to lines of delimited text.
///
/// Lines are handled as raw bytes; nothing requires them to be UTF-8.
pub struct LineProcessor<'a, R: CommandRunner> {
    mappers: &'a [FieldMapper],
    delimiter: &'a [u8],
    runner: &'a R,
}

impl<'a, R: CommandRunner> LineProcessor<'a, R> {
    pub fn new(mappers: &'a [FieldMapper], delimiter: &'a str, runner: &'a R) -> Self {
        Self {
            mappers,
            delimiter: delimiter.as_bytes(),
            runner,
        }
    }

    /// Output fields for one raw line, in mapper order.
    pub fn select_fields(&self, line: &[u8]) -> Vec<Vec<u8>> {
        let line = strip_terminator(line);
        let fields = split_fields(line, self.delimiter);

        let mut selected = Vec::new();
        for mapper in self.mappers {
            for i in mapper.indices(fields.len()) {
                selected.push(transform_field(self.runner, mapper.command(), fields[i]));
            }
        }
        selected
    }

    /// Output line (without terminator) for one raw line.
    pub fn process_line(&self, line: &[u8]) -> Vec<u8> {
        self.select_fields(line).join(self.delimiter)
    }

    /// Process `input` until end of stream, writing one line per input line.
    ///
    /// A final line without a terminator is still processed. Output already
    /// written stays written when a read fails midway. If the reader of
    /// `output` goes away (broken pipe) processing stops without error.
    pub fn process_stream<B: BufRead, W: Write>(
        &self,
        mut input: B,
        mut output: W,
    ) -> CutxResult<ProcessStats> {
        let mut stats = ProcessStats::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            let read = input
                .read_until(b'\n', &mut line)
                .map_err(|source| CutxError::Read {
                    line: stats.lines + 1,
                    source,
                })?;
            if read == 0 {
                break;
            }

            let fields = self.select_fields(&line);
            stats.lines += 1;
            stats.fields += fields.len();

            let mut joined = fields.join(self.delimiter);
            joined.push(b'\n');
            if output_closed(output.write_all(&joined))? {
                return Ok(stats);
            }
        }

        if output_closed(output.flush())? {
            return Ok(stats);
        }
        debug!(lines = stats.lines, fields = stats.fields, "input exhausted");
        Ok(stats)
    }
}

/// Map a write result: `Ok(true)` when the output pipe was closed.
fn output_closed(result: io::Result<()>) -> CutxResult<bool> {
    match result {
        Ok(()) => Ok(false),
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("output closed, stopping");
            Ok(true)
        }
        Err(e) => Err(CutxError::Write(e)),
    }
}

/// Split on a literal delimiter. Adjacent delimiters give empty fields.
fn split_fields<'l>(line: &'l [u8], delimiter: &[u8]) -> Vec<&'l [u8]> {
    if delimiter.is_empty() {
        return vec![line];
    }
    let mut fields = Vec::new();
    let mut rest = line;
    while let Some(pos) = rest
        .windows(delimiter.len())
        .position(|window| window == delimiter)
    {
        fields.push(&rest[..pos]);
        rest = &rest[pos + delimiter.len()..];
    }
    fields.push(rest);
    fields
}

/// Remove one trailing `\n`. A line that is only `\n` is kept as is.
fn strip_terminator(line: &[u8]) -> &[u8] {
    if line.len() > 1 {
        line.strip_suffix(b"\n").unwrap_or(line)
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::field_spec::{FieldEnd, parse_field_spec};
    use std::cell::RefCell;
    use std::ffi::OsStr;
    use std::io::{Cursor, Read};

    /// Treats `echo <text>` as printing `<text>`, fails on anything else.
    #[derive(Default)]
    struct FakeShell {
        calls: RefCell<Vec<String>>,
    }

    impl CommandRunner for FakeShell {
        fn run(&self, command: &OsStr) -> Result<Vec<u8>, TransformError> {
            let command = command.to_string_lossy();
            self.calls.borrow_mut().push(command.to_string());
            match command.strip_prefix("echo ") {
                Some(text) => Ok(format!("{text}\n").into_bytes()),
                None => Err(TransformError::Launch(io::Error::new(
                    ErrorKind::NotFound,
                    "command not found",
                ))),
            }
        }
    }

    fn run_bytes(spec: &str, delimiter: &str, input: &[u8]) -> Vec<u8> {
        let mappers = parse_field_spec(spec).unwrap();
        let shell = FakeShell::default();
        let processor = LineProcessor::new(&mappers, delimiter, &shell);
        let mut out = Vec::new();
        processor.process_stream(Cursor::new(input), &mut out).unwrap();
        out
    }

    fn run(spec: &str, delimiter: &str, input: &str) -> String {
        String::from_utf8(run_bytes(spec, delimiter, input.as_bytes())).unwrap()
    }

    #[test]
    fn test_passthrough_is_identity() {
        let input = "a\tb\tc\n\tempty first\nsingle\nx\t\t\ty\n";
        assert_eq!(run("1-", "\t", input), input);
    }

    #[test]
    fn test_repeated_field() {
        assert_eq!(run("1,1", "\t", "a\tb\nc\td\n"), "a\ta\nc\tc\n");
    }

    #[test]
    fn test_only_selected_fields_are_emitted() {
        assert_eq!(run("2=echo X{}Y", ",", "a,b,c\n"), "XbY\n");
    }

    #[test]
    fn test_mixed_passthrough_and_transform() {
        assert_eq!(run("1,2=echo <{}>,3-", ",", "a,b,c,d\n"), "a,<b>,c,d\n");
    }

    #[test]
    fn test_out_of_range_start_contributes_nothing() {
        assert_eq!(run("99", ",", "a,b,c\n"), "\n");
        assert_eq!(run("1,99,3", ",", "a,b,c\n"), "a,c\n");
    }

    #[test]
    fn test_range_clamped_per_line() {
        let input = "a,b,c,d\na\na,b\n";
        assert_eq!(run("2-3", ",", input), "b,c\n\nb\n");
        assert_eq!(run("2-", ",", input), "b,c,d\n\nb\n");
    }

    #[test]
    fn test_reversed_range_selects_nothing() {
        assert_eq!(run("3-1,1", ",", "a,b,c\n"), "a\n");
    }

    #[test]
    fn test_consecutive_delimiters_are_empty_fields() {
        assert_eq!(run("2,3", ",", "a,,c\n"), ",c\n");
        assert_eq!(run("1-", ",", ",,\n"), ",,\n");
    }

    #[test]
    fn test_multi_char_delimiter() {
        assert_eq!(run("2,1", "::", "a::b::c\n"), "b::a\n");
        assert_eq!(run("2", "::", "a:::b\n"), ":b\n");
    }

    #[test]
    fn test_multibyte_delimiter() {
        assert_eq!(run("2,1", "§", "é§ü\n"), "ü§é\n");
    }

    #[test]
    fn test_failing_command_gives_empty_field() {
        assert_eq!(run("1=false {},2", ",", "a,b\nc,d\n"), ",b\n,d\n");
    }

    #[test]
    fn test_non_utf8_fields_pass_through() {
        assert_eq!(run_bytes("2", ",", b"caf\xe9,b\nx,y\n"), b"b\ny\n");
        assert_eq!(run_bytes("2,1", ",", b"caf\xe9,\xff\xfe\n"), b"\xff\xfe,caf\xe9\n");
    }

    #[test]
    fn test_non_utf8_line_keeps_later_lines() {
        let out = run_bytes("1=echo <{}>,2", ",", b"caf\xe9,b\nx,y\n");
        assert!(out.ends_with(b",b\n<x>,y\n"), "{out:?}");
    }

    #[test]
    fn test_terminator_only_line_kept() {
        let mappers = parse_field_spec("1-").unwrap();
        let shell = FakeShell::default();
        let processor = LineProcessor::new(&mappers, "\t", &shell);
        assert_eq!(processor.process_line(b"\n"), b"\n");
        assert_eq!(processor.process_line(b"ab\n"), b"ab");
        assert_eq!(processor.process_line(b"a\n"), b"a");
    }

    #[test]
    fn test_last_line_without_terminator() {
        assert_eq!(run("2", ",", "a,b\nc,d"), "b\nd\n");
    }

    #[test]
    fn test_commands_run_in_output_order() {
        let mappers = vec![
            FieldMapper::new(1, FieldEnd::OpenEnded, "echo {}"),
            FieldMapper::new(0, FieldEnd::Bounded(0), "echo first={}"),
        ];
        let shell = FakeShell::default();
        let processor = LineProcessor::new(&mappers, ",", &shell);
        assert_eq!(processor.process_line(b"a,b,c\n"), b"b,c,first=a");
        assert_eq!(
            *shell.calls.borrow(),
            vec!["echo b", "echo c", "echo first=a"]
        );
    }

    #[test]
    fn test_stats() {
        let mappers = parse_field_spec("1,3").unwrap();
        let shell = FakeShell::default();
        let processor = LineProcessor::new(&mappers, ",", &shell);
        let mut out = Vec::new();
        let stats = processor
            .process_stream(Cursor::new("a,b,c\nd,e\n"), &mut out)
            .unwrap();
        assert_eq!(stats, ProcessStats { lines: 2, fields: 3 });
    }

    /// Yields one good line, then fails.
    struct BrokenReader {
        served: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::other("disk on fire"));
            }
            self.served = true;
            let line = b"a,b\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn test_read_error_aborts_after_partial_output() {
        let mappers = parse_field_spec("2").unwrap();
        let shell = FakeShell::default();
        let processor = LineProcessor::new(&mappers, ",", &shell);
        let mut out = Vec::new();
        let input = io::BufReader::new(BrokenReader { served: false });
        let err = processor.process_stream(input, &mut out).unwrap_err();
        assert!(matches!(err, CutxError::Read { line: 2, .. }));
        assert_eq!(out, b"b\n");
    }

    /// Accepts `capacity` lines, then reports a closed pipe or another error.
    struct ClosingWriter {
        written: Vec<u8>,
        capacity: usize,
        kind: ErrorKind,
    }

    impl Write for ClosingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.capacity == 0 {
                return Err(io::Error::from(self.kind));
            }
            self.capacity -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_broken_pipe_stops_quietly() {
        let mappers = parse_field_spec("1").unwrap();
        let shell = FakeShell::default();
        let processor = LineProcessor::new(&mappers, ",", &shell);
        let mut output = ClosingWriter {
            written: Vec::new(),
            capacity: 1,
            kind: ErrorKind::BrokenPipe,
        };
        let stats = processor
            .process_stream(Cursor::new("a\nb\nc\n"), &mut output)
            .unwrap();
        assert_eq!(output.written, b"a\n");
        assert_eq!(stats.lines, 2);
    }

    #[test]
    fn test_other_write_error_is_fatal() {
        let mappers = parse_field_spec("1").unwrap();
        let shell = FakeShell::default();
        let processor = LineProcessor::new(&mappers, ",", &shell);
        let output = ClosingWriter {
            written: Vec::new(),
            capacity: 0,
            kind: ErrorKind::PermissionDenied,
        };
        let err = processor
            .process_stream(Cursor::new("a\n"), output)
            .unwrap_err();
        assert!(matches!(err, CutxError::Write(_)));
    }
}
