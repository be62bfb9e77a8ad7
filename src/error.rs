//! Error types for log framing and control-event parsing.

use std::fmt;
use thiserror::Error;

/// Where in a log segment a line starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinePosition {
    /// 1-based line number.
    pub line: u64,
    /// Byte offset of the first byte of the line.
    pub offset: u64,
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} (byte {})", self.line, self.offset)
    }
}

/// Main error type for framing operations.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A control line that does not match `.identifier {json}`.
    #[error("Framing violation ({reason}): {line:?}")]
    FramingViolation { line: String, reason: &'static str },

    /// A known control kind whose body does not decode into its fields.
    #[error("Malformed {kind} body: {source}: {line:?}")]
    BodyDecode {
        kind: String,
        line: String,
        #[source]
        source: serde_json::Error,
    },

    /// The redundant `type` field inside a body disagrees with the line prefix.
    #[error("Type tag mismatch: prefix {prefix}, body {body}: {line:?}")]
    TagMismatch {
        prefix: String,
        body: String,
        line: String,
    },

    #[error("Data line contains an embedded newline: {0:?}")]
    EmbeddedNewline(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An error found while reading a segment, with its location.
    #[error("{position}: {source}")]
    At {
        position: LinePosition,
        #[source]
        source: Box<FrameError>,
    },
}

impl FrameError {
    /// Attach a segment position to this error.
    pub fn at(self, position: LinePosition) -> Self {
        FrameError::At {
            position,
            source: Box::new(self),
        }
    }

    /// The position this error was found at, if it came from a segment.
    pub fn position(&self) -> Option<LinePosition> {
        match self {
            FrameError::At { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// The offending raw line, for errors that carry one.
    pub fn raw_line(&self) -> Option<&str> {
        match self {
            FrameError::FramingViolation { line, .. }
            | FrameError::BodyDecode { line, .. }
            | FrameError::TagMismatch { line, .. }
            | FrameError::EmbeddedNewline(line) => Some(line.as_str()),
            FrameError::At { source, .. } => source.raw_line(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FrameError {
    fn from(e: serde_json::Error) -> Self {
        FrameError::Serialization(e.to_string())
    }
}

/// Result type for framing operations.
pub type Result<T> = std::result::Result<T, FrameError>;
