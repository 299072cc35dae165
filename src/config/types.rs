//! Configuration types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::encoding::TextEncoding;

fn default_true() -> bool {
    true
}

/// Configuration for a [`ProcessChannel`](crate::channel::ProcessChannel).
///
/// Doubles as a builder: setters consume and return `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Program followed by its arguments.
    pub command: Vec<String>,
    /// Encoding used on stdin, stdout and stderr.
    #[serde(default)]
    pub encoding: TextEncoding,
    /// Directory the tool is spawned in. Inherited when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Run the tool under `stdbuf -i0 -o0` when available.
    #[serde(default = "default_true")]
    pub stdbuf: bool,
    /// Start the tool as soon as the channel is created.
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

impl ChannelConfig {
    /// Create a configuration for the given argv with default options.
    #[must_use]
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            encoding: TextEncoding::default(),
            working_dir: None,
            stdbuf: true,
            auto_start: true,
        }
    }

    /// Set the text encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the working directory for the tool process.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Enable or disable the `stdbuf` buffering fix.
    #[must_use]
    pub fn stdbuf(mut self, enabled: bool) -> Self {
        self.stdbuf = enabled;
        self
    }

    /// Control whether the channel starts on construction.
    #[must_use]
    pub fn auto_start(mut self, enabled: bool) -> Self {
        self.auto_start = enabled;
        self
    }

    /// Get the working directory, if set.
    #[must_use]
    pub fn get_working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}
