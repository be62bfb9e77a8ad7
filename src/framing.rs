//! Data/control line framing.
//!
//! A log line starting with `.` is a control line. A data line that would
//! otherwise start with `.` or `\` is written with one extra leading `\`.

use std::borrow::Cow;

const CONTROL_PREFIX: u8 = b'.';
const ESCAPE: u8 = b'\\';

/// A classified log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line<'a> {
    /// Application payload, already unescaped.
    Data(Cow<'a, str>),
    /// A control line, unchanged, for [`crate::control::parse`].
    Control(&'a str),
}

impl<'a> Line<'a> {
    pub fn is_control(&self) -> bool {
        matches!(self, Line::Control(_))
    }

    /// The data payload, or the raw control line.
    pub fn payload(&self) -> &str {
        match self {
            Line::Data(data) => &**data,
            Line::Control(line) => *line,
        }
    }
}

/// Classify one line (without its newline).
pub fn classify(line: &str) -> Line<'_> {
    match line.as_bytes().first() {
        Some(&CONTROL_PREFIX) => Line::Control(line),
        Some(&ESCAPE) => Line::Data(Cow::Borrowed(&line[1..])),
        _ => Line::Data(Cow::Borrowed(line)),
    }
}

/// Escape a data line so [`classify`] returns it unchanged as data.
pub fn escape_for_append(line: &str) -> Cow<'_, str> {
    match line.as_bytes().first() {
        Some(&CONTROL_PREFIX) | Some(&ESCAPE) => {
            let mut escaped = String::with_capacity(line.len() + 1);
            escaped.push('\\');
            escaped.push_str(line);
            Cow::Owned(escaped)
        }
        _ => Cow::Borrowed(line),
    }
}
