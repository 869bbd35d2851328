//! Usage help templates
//!
//! Help output is driven by clap templates. The root command installs a
//! template that appends an explanation of how configuration values are
//! resolved.

use thiserror::Error;

/// clap's built-in help template
pub const DEFAULT_HELP_TEMPLATE: &str = "\
{before-help}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}";

/// Placeholders clap knows how to render
const KNOWN_TAGS: &[&str] = &[
    "name",
    "bin",
    "version",
    "author",
    "author-with-newline",
    "author-section",
    "about",
    "about-with-newline",
    "about-section",
    "usage-heading",
    "usage",
    "all-args",
    "options",
    "positionals",
    "subcommands",
    "tab",
    "after-help",
    "before-help",
];

const CONFIG_HELP: &str = "

Configuration:

  The flags of the install commands and --kubernetes-namespace can also be
  set in a YAML configuration file. Keys are the flag names without the
  leading dashes. Words separated by '-' in a flag name become nested keys,
  so --kubernetes-namespace is read from:

    kubernetes:
      namespace: uyuni

  Supported keys: registry, tag, pullPolicy, kubernetes.namespace and
  podman.arg. Any other key is rejected. The uninstall flags --backend,
  --force and --purge-volumes are only read from the command line.

  Values are resolved in this order, the first one found wins:
    1. command line flags
    2. environment variables prefixed with UYUNI_, e.g. UYUNI_KUBERNETES_NAMESPACE
    3. the file passed with --config
    4. defaults.yaml in the user configuration directory (UYUNI_CONFIG_DIR)
    5. built-in defaults
";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unbalanced brace at offset {position} in usage template")]
    Unbalanced { position: usize },

    #[error("unknown placeholder '{{{0}}}' in usage template")]
    UnknownTag(String),
}

/// Derives the usage template installed on the root command
#[cfg_attr(test, mockall::automock)]
pub trait UsageTemplateProvider {
    fn with_config_help(&self, default_template: &str) -> Result<String, TemplateError>;
}

/// Appends the configuration help section to a valid template
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigHelpTemplate;

impl UsageTemplateProvider for ConfigHelpTemplate {
    fn with_config_help(&self, default_template: &str) -> Result<String, TemplateError> {
        validate_template(default_template)?;
        let mut template = default_template.trim_end().to_string();
        template.push_str(CONFIG_HELP);
        Ok(template)
    }
}

/// Check that every `{tag}` is closed and known to clap
pub fn validate_template(template: &str) -> Result<(), TemplateError> {
    let mut open: Option<usize> = None;

    for (position, c) in template.char_indices() {
        match (c, open) {
            ('{', None) => open = Some(position),
            ('{', Some(_)) | ('}', None) => return Err(TemplateError::Unbalanced { position }),
            ('}', Some(start)) => {
                let tag = &template[start + 1..position];
                if !KNOWN_TAGS.contains(&tag) {
                    return Err(TemplateError::UnknownTag(tag.to_string()));
                }
                open = None;
            }
            _ => {}
        }
    }

    match open {
        Some(position) => Err(TemplateError::Unbalanced { position }),
        None => Ok(()),
    }
}
