//! Persistent pre-run hook

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use super::flags::GlobalConfig;
use super::logging::{LogBootstrap, LogLevelError};

/// Name of the completion subcommand
///
/// Its stdout is sourced by shells, so nothing else may be printed when it runs.
pub const COMPLETION_COMMAND: &str = "completion";

/// Hook run once after flag parsing and before the selected command body
///
/// This is the only place logging gets initialized.
pub struct PreRunHook {
    program_name: String,
    quiet_commands: BTreeSet<String>,
    bootstrap: Rc<dyn LogBootstrap>,
}

impl PreRunHook {
    /// Create a hook logging the welcome lines for every command
    pub fn new(program_name: impl Into<String>, bootstrap: Rc<dyn LogBootstrap>) -> Self {
        Self {
            program_name: program_name.into(),
            quiet_commands: BTreeSet::new(),
            bootstrap,
        }
    }

    /// Skip the welcome lines when one of `names` is selected
    pub fn with_quiet_commands<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quiet_commands.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_quiet(&self, command: &str) -> bool {
        self.quiet_commands.contains(command)
    }

    pub fn run(&self, selected: &str, config: &GlobalConfig) -> Result<(), LogLevelError> {
        self.bootstrap.init();
        self.bootstrap.set_level(&config.log_level)?;

        if !self.is_quiet(selected) {
            tracing::info!("Welcome to {}", self.program_name);
            tracing::info!("Executing command: {}", selected);
        }
        Ok(())
    }
}

impl fmt::Debug for PreRunHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreRunHook")
            .field("program_name", &self.program_name)
            .field("quiet_commands", &self.quiet_commands)
            .finish_non_exhaustive()
    }
}
