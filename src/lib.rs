//! Toolwrapper - line-oriented request/response wrapper around external
//! text-processing tools.
//!
//! A tool is launched once as a child process and driven synchronously:
//! write a line to its stdin, read a line from its stdout, repeat.

pub mod channel;
pub mod config;
pub mod encoding;

pub use channel::{
    with_channel, ChannelError, ChannelStatus, LifecycleError, ProcessChannel, SpawnError,
};
pub use config::{ChannelConfig, ConfigError, ConfigLoader};
pub use encoding::{EncodingError, TextEncoding};
