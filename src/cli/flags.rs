//! Global flags shared by every command of the tree

use clap::{Arg, ArgAction, ArgMatches};

/// Cross-cutting settings resolved from the persistent flags
///
/// Built once by the dispatcher after argument parsing and handed by
/// reference to the pre-run hook and to the selected command body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Configuration file path, empty when no file was given
    pub config_path: String,

    /// Requested log level, empty for the default level
    pub log_level: String,
}

/// Field of [`GlobalConfig`] a persistent flag writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    ConfigPath,
    LogLevel,
}

impl ConfigField {
    /// Store `value` into the matching field of `config`
    pub fn assign(self, config: &mut GlobalConfig, value: String) {
        match self {
            ConfigField::ConfigPath => config.config_path = value,
            ConfigField::LogLevel => config.log_level = value,
        }
    }
}

/// A flag declared on a node and inherited by all of its descendants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDefinition {
    pub long_name: String,
    pub short_name: Option<char>,
    pub target: ConfigField,
    pub default: String,
    pub help: String,
}

impl FlagDefinition {
    pub fn new(
        long_name: impl Into<String>,
        target: ConfigField,
        default: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        Self {
            long_name: long_name.into(),
            short_name: None,
            target,
            default: default.into(),
            help: help.into(),
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short_name = Some(short);
        self
    }

    /// Render the flag as a global clap argument
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.long_name.clone())
            .long(self.long_name.clone())
            .help(self.help.clone())
            .action(ArgAction::Set)
            .global(true);

        if let Some(short) = self.short_name {
            arg = arg.short(short);
        }
        // An empty default means "unset": leave clap without a default value
        if !self.default.is_empty() {
            arg = arg.default_value(self.default.clone());
        }
        arg
    }
}

impl GlobalConfig {
    /// Resolve the configuration from parsed matches
    ///
    /// `matches` should be the matches of the selected command: clap
    /// propagates global arguments down to it.
    pub fn from_matches<'a, I>(flags: I, matches: &ArgMatches) -> Self
    where
        I: IntoIterator<Item = &'a FlagDefinition>,
    {
        let mut config = GlobalConfig::default();
        for flag in flags {
            let value = matches
                .try_get_one::<String>(&flag.long_name)
                .ok()
                .flatten()
                .cloned()
                .unwrap_or_else(|| flag.default.clone());
            flag.target.assign(&mut config, value);
        }
        config
    }
}
