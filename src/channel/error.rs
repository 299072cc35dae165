//! Channel error types.

use crate::encoding::EncodingError;

/// Operation attempted in the wrong lifecycle state.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// `start` called while the tool is running.
    #[error("not closed")]
    NotClosed,
    /// Read or write attempted while the tool is not running.
    #[error("closed")]
    Closed,
}

impl LifecycleError {
    /// Short reason string, `"not closed"` or `"closed"`.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::NotClosed => "not closed",
            Self::Closed => "closed",
        }
    }
}

/// Error type for tool spawning.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The command vector has no program.
    #[error("Empty command")]
    EmptyCommand,
    /// The program (or working directory) was not found.
    #[error("Tool not found: {program}")]
    NotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// Permission denied when spawning.
    #[error("Permission denied: {program}")]
    PermissionDenied {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    pub(crate) fn from_io(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                program: program.to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                program: program.to_string(),
                source: err,
            },
            _ => Self::Io(err),
        }
    }
}

/// Errors returned by [`ProcessChannel`](super::ProcessChannel) operations.
#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Failed to spawn tool: {0}")]
    Spawn(#[from] SpawnError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Pipe I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tool's output pipe reached end of stream.
    #[error("End of stream from tool")]
    EndOfStream,
}

impl ChannelError {
    /// The lifecycle violation carried by this error, if any.
    #[must_use]
    pub fn lifecycle(&self) -> Option<LifecycleError> {
        match self {
            Self::Lifecycle(e) => Some(*e),
            _ => None,
        }
    }

    /// Whether this error marks the end of the tool's output.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
