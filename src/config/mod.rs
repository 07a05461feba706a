//! Configuration resolution.
//!
//! Merges built-in defaults, the on-disk config file, and command-line
//! flags with a fixed precedence (defaults < file < flags), and
//! provisions the data directory the loader writes to.

pub mod args;
pub mod loader;
pub mod paths;

pub use loader::{Config, ConfigError, LogLevel, Resolution, load};
pub use paths::Paths;
