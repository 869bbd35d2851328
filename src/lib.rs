//! Uyuni proxy administration library
//!
//! Assembles the `mgrpxy` command tree: global flags, the logging pre-run
//! hook, the usage template and the install, uninstall and completion
//! subcommands. It can be used both as a binary and as a library for testing.

pub mod cli;
pub mod commands;
pub mod config;

// Re-export commonly used types for convenience
pub use cli::{CommandNode, GlobalConfig, build_root_command, dispatch};
pub use commands::ProxyCommands;
