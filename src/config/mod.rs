//! Channel configuration and configuration file loading.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
