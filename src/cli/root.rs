//! Root command assembly

use std::ffi::OsStr;
use std::path::Path;
use std::rc::Rc;

use thiserror::Error;

use super::flags::{ConfigField, FlagDefinition};
use super::hook::{COMPLETION_COMMAND, PreRunHook};
use super::logging::{LOG_LEVELS, LogBootstrap};
use super::node::CommandNode;
use super::usage::{TemplateError, UsageTemplateProvider};

const SHORT_DESCRIPTION: &str = "Uyuni proxy administration tool";
const LONG_DESCRIPTION: &str =
    "Uyuni tool used to help user administer uyuni proxies on kubernetes and podman";

/// Builds the subcommands attached to the root command
#[cfg_attr(test, mockall::automock)]
pub trait SubcommandFactory {
    fn install(&self) -> CommandNode;

    /// May fail when backend specific state cannot be resolved
    fn uninstall(&self) -> anyhow::Result<CommandNode>;

    fn completion(&self) -> CommandNode;
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to derive usage template")]
    UsageTemplate(#[from] TemplateError),

    #[error("failed to create uninstall command")]
    Uninstall(#[source] anyhow::Error),
}

/// A failed build together with the root command as built so far
///
/// Callers must not execute `root`: it is only kept for diagnostics.
#[derive(Debug, Error)]
#[error("failed to build the command tree")]
pub struct PartialBuild {
    pub root: CommandNode,
    #[source]
    pub error: BuildError,
}

impl PartialBuild {
    fn new(root: CommandNode, error: impl Into<BuildError>) -> Box<Self> {
        Box::new(Self {
            root,
            error: error.into(),
        })
    }
}

/// Crate version reported by `--version`
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Base name of the executable, used as the root command name
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .map(|arg0| base_name(&arg0))
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

pub fn base_name(arg0: &OsStr) -> String {
    Path::new(arg0)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Persistent flags of the root command
pub fn global_flags() -> Vec<FlagDefinition> {
    vec![
        FlagDefinition::new(
            "config",
            ConfigField::ConfigPath,
            "",
            "configuration file path",
        )
        .short('c'),
        FlagDefinition::new(
            "logLevel",
            ConfigField::LogLevel,
            "",
            format!("application log level ({LOG_LEVELS})"),
        ),
    ]
}

/// Build the root command and attach every subcommand
///
/// Stops at the first failure and returns the partially built root with the
/// error. No I/O is performed here, subcommand factories aside.
pub fn build_root_command(
    name: &str,
    factory: &dyn SubcommandFactory,
    usage: &dyn UsageTemplateProvider,
    bootstrap: Rc<dyn LogBootstrap>,
) -> Result<CommandNode, Box<PartialBuild>> {
    let mut root = CommandNode::new(name)
        .short(SHORT_DESCRIPTION)
        .long(LONG_DESCRIPTION);
    root.version = Some(version().to_string());
    root.silence_usage = true;

    let template = match usage.with_config_help(root.usage_template()) {
        Ok(template) => template,
        Err(e) => return Err(PartialBuild::new(root, e)),
    };
    root.set_usage_template(template);

    root.pre_run =
        Some(PreRunHook::new(name, bootstrap).with_quiet_commands([COMPLETION_COMMAND]));
    for flag in global_flags() {
        root.add_persistent_flag(flag);
    }

    root.add_command(factory.install());
    match factory.uninstall() {
        Ok(uninstall) => root.add_command(uninstall),
        Err(e) => return Err(PartialBuild::new(root, BuildError::Uninstall(e))),
    }
    root.add_command(factory.completion());

    tracing::trace!("Built command tree: {:?}", root.child_names());
    Ok(root)
}
