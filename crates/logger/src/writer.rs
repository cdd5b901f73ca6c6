//! The line-buffering writer and the capability trait it implements.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use chrono::Utc;

use crate::record::LogRecord;
use crate::sink::LogSink;

/// Capability set every concrete cluster logger must support: emit a line,
/// emit a formatted line, scope itself with a prefix, and (via the
/// [`Write`] supertrait) accept a raw byte stream and flush it.
pub trait ClusterLogger: Write + Send {
    /// Emit `message` immediately, bypassing the byte buffer.
    fn log(&self, message: &str);

    /// Emit a formatted message immediately, bypassing the byte buffer.
    fn logf(&self, args: fmt::Arguments<'_>);

    /// A new logger whose prefix is `parent/suffix`, sharing this logger's
    /// sink but owning its own (empty) byte buffer.
    fn scoped(&self, suffix: &str) -> Self
    where
        Self: Sized;
}

/// Verbosity requested for a leveled log handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Ordinary informational output.
    Info,
    /// Debug output at the given numeric level.
    Debug(u32),
}

impl Verbosity {
    /// Whether this verbosity is the debug variant.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        matches!(self, Self::Debug(_))
    }
}

/// Adapts a raw byte stream into discrete, prefixed, timestamped records.
///
/// Bytes accumulate in an internal buffer; every completed line is emitted to
/// the attached sink during the `write` call that completed it, and the
/// trailing partial line is retained until the next write or a flush. Between
/// calls the buffer never contains a newline.
///
/// One writer serves one logical stream of output. Concurrent producers
/// should each take their own writer via [`ClusterLogger::scoped`] rather
/// than share one instance.
pub struct LineBufferedWriter {
    prefix: String,
    buffer: Vec<u8>,
    sink: Arc<dyn LogSink>,
}

impl LineBufferedWriter {
    /// Create a writer emitting into `sink` under `prefix`.
    pub fn new(sink: Arc<dyn LogSink>, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            buffer: Vec::new(),
            sink,
        }
    }

    /// The prefix carried by every record this writer emits.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Emit a warning message. Records carry no level tag, so this emits
    /// exactly like [`ClusterLogger::log`].
    pub fn warn(&self, message: &str) {
        self.emit(message);
    }

    /// Emit an error message. Records carry no level tag, so this emits
    /// exactly like [`ClusterLogger::log`].
    pub fn error(&self, message: &str) {
        self.emit(message);
    }

    /// A leveled handle at the requested verbosity.
    #[must_use]
    pub const fn v(&self, verbosity: Verbosity) -> LeveledLogger<'_> {
        LeveledLogger {
            writer: self,
            verbosity,
            enabled: true,
        }
    }

    fn emit(&self, message: &str) {
        self.sink.emit(LogRecord {
            timestamp: Utc::now(),
            prefix: self.prefix.clone(),
            message: message.to_string(),
        });
    }
}

impl ClusterLogger for LineBufferedWriter {
    fn log(&self, message: &str) {
        self.emit(message);
    }

    fn logf(&self, args: fmt::Arguments<'_>) {
        self.emit(&args.to_string());
    }

    fn scoped(&self, suffix: &str) -> Self {
        Self::new(
            Arc::clone(&self.sink),
            format!("{}/{}", self.prefix, suffix),
        )
    }
}

/// Writes never fail and always accept the full input; sink trouble is not a
/// write error. A `\r` immediately before the newline is stripped from the
/// completed line (CRLF tolerance); buffered partial content is kept intact.
impl Write for LineBufferedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            self.emit(&String::from_utf8_lossy(line));
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.emit(&String::from_utf8_lossy(&pending));
        }

        Ok(())
    }
}

/// Leveled handle returned by [`LineBufferedWriter::v`].
///
/// Debug verbosity currently emits exactly like info; the numeric level is
/// carried but does not change the output.
pub struct LeveledLogger<'a> {
    writer: &'a LineBufferedWriter,
    verbosity: Verbosity,
    enabled: bool,
}

impl LeveledLogger<'_> {
    /// Whether messages at this verbosity will be emitted.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// The verbosity this handle was requested at.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Emit `message` if this verbosity is enabled.
    pub fn info(&self, message: &str) {
        if self.enabled {
            self.writer.emit(message);
        }
    }

    /// Emit a formatted message if this verbosity is enabled.
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        if self.enabled {
            self.writer.emit(&args.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn capture(prefix: &str) -> (Arc<MemorySink>, LineBufferedWriter) {
        let sink = Arc::new(MemorySink::new());
        let writer = LineBufferedWriter::new(Arc::clone(&sink) as Arc<dyn LogSink>, prefix);
        (sink, writer)
    }

    #[test]
    fn splits_lines_across_writes() {
        let (sink, mut writer) = capture("Kind");

        writer.write_all(b"hello wo").unwrap();
        writer.write_all(b"rld\nfoo").unwrap();
        writer.write_all(b"bar\n").unwrap();

        assert_eq!(sink.messages(), vec!["hello world", "foobar"]);
        assert!(writer.buffer.is_empty());
    }

    #[test]
    fn flush_releases_trailing_partial_line() {
        let (sink, mut writer) = capture("Kind");

        writer.write_all(b"line1\nline2\nline3").unwrap();
        writer.write_all(b"").unwrap();
        writer.flush().unwrap();

        assert_eq!(sink.messages(), vec!["line1", "line2", "line3"]);
    }

    #[test]
    fn flush_with_empty_buffer_is_a_noop() {
        let (sink, mut writer) = capture("Kind");

        writer.write_all(b"abc\n").unwrap();
        writer.flush().unwrap();
        writer.flush().unwrap();

        assert_eq!(sink.messages(), vec!["abc"]);
    }

    #[test]
    fn lone_newline_drains_buffered_content() {
        let (sink, mut writer) = capture("Kind");

        writer.write_all(b"abc").unwrap();
        writer.write_all(b"\n").unwrap();

        assert_eq!(sink.messages(), vec!["abc"]);
        assert!(writer.buffer.is_empty());

        writer.flush().unwrap();
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn empty_write_accepts_zero_bytes() {
        let (sink, mut writer) = capture("Kind");

        assert_eq!(writer.write(b"").unwrap(), 0);
        assert!(sink.records().is_empty());
        assert!(writer.buffer.is_empty());
    }

    #[test]
    fn write_reports_all_bytes_accepted() {
        let (_sink, mut writer) = capture("Kind");

        assert_eq!(writer.write(b"abc\ndef").unwrap(), 7);
    }

    #[test]
    fn no_bytes_are_lost_across_arbitrary_splits() {
        let input = b"alpha\nbeta\ngamma";

        for split in 0..=input.len() {
            let (sink, mut writer) = capture("Kind");
            writer.write_all(&input[..split]).unwrap();
            writer.write_all(&input[split..]).unwrap();
            writer.flush().unwrap();

            assert_eq!(
                sink.messages().join("\n").as_bytes(),
                input,
                "bytes lost when splitting at {split}"
            );
        }
    }

    #[test]
    fn trailing_newline_leaves_nothing_for_flush() {
        let input = b"alpha\nbeta\n";

        let (sink, mut writer) = capture("Kind");
        writer.write_all(input).unwrap();
        writer.flush().unwrap();

        assert_eq!(sink.messages(), vec!["alpha", "beta"]);
    }

    #[test]
    fn strips_carriage_return_before_newline_only() {
        let (sink, mut writer) = capture("Kind");

        writer.write_all(b"win\r\nmid\rdle\n").unwrap();

        assert_eq!(sink.messages(), vec!["win", "mid\rdle"]);
    }

    #[test]
    fn log_bypasses_the_buffer() {
        let (sink, mut writer) = capture("Kind");

        writer.write_all(b"partial").unwrap();
        writer.log("direct");
        writer.logf(format_args!("answer {}", 42));

        assert_eq!(sink.messages(), vec!["direct", "answer 42"]);
        assert_eq!(writer.buffer, b"partial");
    }

    #[test]
    fn scoped_writer_extends_prefix_without_sharing_buffer() {
        let (sink, mut parent) = capture("Kind");

        parent.write_all(b"abc").unwrap();

        let mut child = parent.scoped("sub");
        assert_eq!(child.prefix(), "Kind/sub");

        child.write_all(b"xyz\n").unwrap();
        parent.flush().unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prefix, "Kind/sub");
        assert_eq!(records[0].message, "xyz");
        assert_eq!(records[1].prefix, "Kind");
        assert_eq!(records[1].message, "abc");
    }

    #[test]
    fn warn_and_error_emit_plain_records() {
        let (sink, writer) = capture("Kind");

        writer.warn("watch out");
        writer.error("it broke");

        assert_eq!(sink.messages(), vec!["watch out", "it broke"]);
    }

    #[test]
    fn leveled_handle_emits_identically_at_any_verbosity() {
        let (sink, writer) = capture("Kind");

        let info = writer.v(Verbosity::Info);
        let debug = writer.v(Verbosity::Debug(4));

        assert!(info.enabled());
        assert!(debug.enabled());
        assert!(!info.verbosity().is_debug());
        assert!(debug.verbosity().is_debug());

        info.info("same");
        debug.infof(format_args!("same"));

        assert_eq!(sink.messages(), vec!["same", "same"]);
    }

    #[test]
    fn lossy_decoding_keeps_invalid_utf8_lines() {
        let (sink, mut writer) = capture("Kind");

        writer.write_all(b"ok \xff bytes\n").unwrap();

        assert_eq!(sink.messages(), vec!["ok \u{fffd} bytes"]);
    }
}
