//! Line-oriented channel to a long-lived tool process.
//!
//! A [`ProcessChannel`] spawns a command with piped standard streams and
//! exchanges newline-terminated records with it: one line written, one line
//! read, repeated. The child is killed and reaped on [`ProcessChannel::close`]
//! or when the channel is dropped.

mod error;
mod process;
mod state;
mod stream;

pub use error::{ChannelError, LifecycleError, SpawnError};
pub use process::{with_channel, ProcessChannel};
pub use state::ChannelStatus;
