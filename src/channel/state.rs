//! Channel lifecycle state.

use std::fmt;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout};

use super::stream::{LineReader, LineWriter};

/// Observable lifecycle status of a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelStatus {
    #[default]
    Unstarted,
    Running,
    Closed,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unstarted => "unstarted",
            Self::Running => "running",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Process handle and pipe adapters owned while the tool runs.
#[derive(Debug)]
pub(crate) struct RunningTool {
    pub(crate) child: Child,
    pub(crate) stdin: LineWriter<ChildStdin>,
    pub(crate) stdout: LineReader<ChildStdout>,
    pub(crate) stderr: LineReader<ChildStderr>,
}

impl RunningTool {
    pub(crate) fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Internal state; the running bundle only exists in `Running`.
#[derive(Debug, Default)]
pub(crate) enum ChannelState {
    #[default]
    Unstarted,
    Running(RunningTool),
    Closed,
}

impl ChannelState {
    pub(crate) fn status(&self) -> ChannelStatus {
        match self {
            Self::Unstarted => ChannelStatus::Unstarted,
            Self::Running(_) => ChannelStatus::Running,
            Self::Closed => ChannelStatus::Closed,
        }
    }
}
