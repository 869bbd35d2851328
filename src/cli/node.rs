//! Command tree nodes
//!
//! A [`CommandNode`] describes one invocable verb: its identity, flags,
//! children and body. The tree is rendered into a `clap::Command` only at
//! dispatch time.

use std::fmt;

use clap::{Arg, ArgMatches, Command};

use super::flags::{FlagDefinition, GlobalConfig};
use super::hook::PreRunHook;
use super::usage::DEFAULT_HELP_TEMPLATE;

/// Everything a command body can observe when it runs
pub struct RunContext<'a> {
    /// Resolved global flags
    pub config: &'a GlobalConfig,
    /// Matches of the selected command
    pub matches: &'a ArgMatches,
    /// The whole rendered command tree
    pub cli: &'a Command,
}

/// Body of a command
pub type Handler = Box<dyn Fn(&RunContext<'_>) -> anyhow::Result<()>>;

/// One node of the command tree
pub struct CommandNode {
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub version: Option<String>,
    /// Do not print usage when the body fails
    pub silence_usage: bool,
    /// Hook run after parsing and before the selected body, inherited by descendants
    pub pre_run: Option<PreRunHook>,
    pub persistent_flags: Vec<FlagDefinition>,
    /// Local arguments, not inherited
    pub args: Vec<Arg>,
    pub children: Vec<CommandNode>,
    pub usage_template: Option<String>,
    pub run: Option<Handler>,
}

impl CommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_description: String::new(),
            long_description: String::new(),
            version: None,
            silence_usage: false,
            pre_run: None,
            persistent_flags: Vec::new(),
            args: Vec::new(),
            children: Vec::new(),
            usage_template: None,
            run: None,
        }
    }

    pub fn short(mut self, description: impl Into<String>) -> Self {
        self.short_description = description.into();
        self
    }

    pub fn long(mut self, description: impl Into<String>) -> Self {
        self.long_description = description.into();
        self
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn child(mut self, node: CommandNode) -> Self {
        self.add_command(node);
        self
    }

    pub fn run<F>(mut self, body: F) -> Self
    where
        F: Fn(&RunContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.run = Some(Box::new(body));
        self
    }

    /// Append a child; children keep their insertion order in help output
    pub fn add_command(&mut self, node: CommandNode) {
        self.children.push(node);
    }

    pub fn add_persistent_flag(&mut self, flag: FlagDefinition) {
        self.persistent_flags.push(flag);
    }

    /// The template installed on this node, or clap's default one
    pub fn usage_template(&self) -> &str {
        self.usage_template.as_deref().unwrap_or(DEFAULT_HELP_TEMPLATE)
    }

    pub fn set_usage_template(&mut self, template: impl Into<String>) {
        self.usage_template = Some(template.into());
    }

    pub fn find_child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|child| child.name.as_str()).collect()
    }

    pub fn is_runnable(&self) -> bool {
        self.run.is_some()
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("silence_usage", &self.silence_usage)
            .field("pre_run", &self.pre_run)
            .field("persistent_flags", &self.persistent_flags)
            .field("children", &self.children)
            .field("runnable", &self.is_runnable())
            .finish_non_exhaustive()
    }
}
