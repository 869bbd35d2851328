//! Command tree construction and dispatch
//!
//! Builds the root command with its global flags, pre-run hook and usage
//! template, then hands the tree to clap for parsing and execution.

pub mod dispatch;
pub mod flags;
pub mod hook;
pub mod logging;
pub mod node;
pub mod root;
pub mod usage;

pub use dispatch::{DispatchError, dispatch, to_clap};
pub use flags::{ConfigField, FlagDefinition, GlobalConfig};
pub use hook::{COMPLETION_COMMAND, PreRunHook};
pub use logging::{LogBootstrap, LogLevelError, TracingBootstrap};
pub use node::{CommandNode, Handler, RunContext};
pub use root::{
    BuildError, PartialBuild, SubcommandFactory, build_root_command, program_name, version,
};
pub use usage::{ConfigHelpTemplate, TemplateError, UsageTemplateProvider};
