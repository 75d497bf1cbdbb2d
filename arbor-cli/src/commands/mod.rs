//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `get`: Print the value at a path
//! - `set`: Store a value at a path
//! - `keys`: List the keys below a path
//! - `dump`: Print the whole configuration
//! - `rename`: Move a value to a new path

pub mod dump;
pub mod get;
pub mod keys;
pub mod rename;
pub mod set;

pub use dump::DumpCommand;
pub use get::GetCommand;
pub use keys::KeysCommand;
pub use rename::RenameCommand;
pub use set::SetCommand;
