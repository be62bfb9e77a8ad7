//! Reading and writing log segments.
//!
//! A segment is a sequence of newline-terminated lines mixing escaped data
//! lines and control lines. The reader stops at the first framing or body
//! error and reports where it happened; it never skips a corrupt line.

use crate::control::{self, ControlEvent};
use crate::error::{FrameError, LinePosition, Result};
use crate::framing::{classify, escape_for_append, Line};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, warn};

/// One line of a segment, classified and decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Unescaped application payload.
    Data(String),
    Control(ControlEvent),
}

/// Iterator over the entries of a segment.
pub struct SegmentReader<R> {
    reader: R,
    buf: String,
    /// Lines consumed so far.
    line: u64,
    /// Bytes consumed so far.
    offset: u64,
    halted: bool,
}

impl SegmentReader<BufReader<File>> {
    /// Open a segment file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> SegmentReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line: 0,
            offset: 0,
            halted: false,
        }
    }

    /// Position the next line will be read from.
    pub fn next_position(&self) -> LinePosition {
        LinePosition {
            line: self.line + 1,
            offset: self.offset,
        }
    }

    fn halt(&mut self, error: FrameError, position: LinePosition) -> FrameError {
        self.halted = true;
        warn!(%position, %error, "halting segment read");
        error.at(position)
    }
}

impl<R: BufRead> Iterator for SegmentReader<R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }

        let position = self.next_position();
        self.buf.clear();
        let read = match self.reader.read_line(&mut self.buf) {
            Ok(0) => return None,
            Ok(read) => read,
            Err(e) => return Some(Err(self.halt(e.into(), position))),
        };
        self.line += 1;
        self.offset += read as u64;

        let text = self.buf.strip_suffix('\n').unwrap_or(&self.buf);
        let parsed = match classify(text) {
            Line::Data(data) => return Some(Ok(Entry::Data(data.into_owned()))),
            Line::Control(raw) => control::parse(raw),
        };

        match parsed {
            Ok(event) => {
                if !event.is_recognized() {
                    debug!(kind = event.kind(), %position, "unrecognized control event");
                }
                Some(Ok(Entry::Control(event)))
            }
            Err(e) => Some(Err(self.halt(e, position))),
        }
    }
}

/// Appends escaped data lines and control lines to a segment.
pub struct SegmentWriter<W: Write> {
    writer: W,
    lines_written: u64,
}

impl<W: Write> SegmentWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    /// Append one data line, escaping it if it would read as control.
    pub fn append_data(&mut self, data: &str) -> Result<()> {
        if data.contains('\n') {
            return Err(FrameError::EmbeddedNewline(data.to_string()));
        }

        let escaped = escape_for_append(data);
        let mut line = String::with_capacity(escaped.len() + 1);
        line.push_str(&escaped);
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.lines_written += 1;
        Ok(())
    }

    /// Append a control event in its canonical form.
    pub fn append_event(&mut self, event: &ControlEvent) -> Result<()> {
        let line = event.to_line()?;
        self.writer.write_all(line.as_bytes())?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
