//! Subcommands attached to the root command
//!
//! Bodies compute the steps needed to install or remove the proxy and report
//! them; they never run container tooling themselves.

pub mod completion;
pub mod install;
pub mod uninstall;

use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use clap::ValueEnum;

use crate::cli::{CommandNode, SubcommandFactory};

/// Container backends a proxy can be deployed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Single host deployment managed by systemd
    Podman,
    /// Kubernetes deployment managed by helm
    Kubectl,
}

impl Backend {
    pub fn binary(self) -> &'static str {
        match self {
            Backend::Podman => "podman",
            Backend::Kubectl => "kubectl",
        }
    }

    /// Backends whose binary is found in `search_path`
    pub fn detect(search_path: &std::ffi::OsStr) -> Vec<Backend> {
        [Backend::Podman, Backend::Kubectl]
            .into_iter()
            .filter(|backend| {
                std::env::split_paths(search_path)
                    .any(|dir| dir.join(backend.binary()).is_file())
            })
            .collect()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Ordered list of shell steps a command would perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub title: String,
    pub steps: Vec<String>,
    pub dry_run: bool,
}

impl Plan {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            steps: Vec::new(),
            dry_run: false,
        }
    }

    pub fn step(&mut self, step: impl Into<String>) {
        self.steps.push(step.into());
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "{} (dry run, pass --force to apply)", self.title)?;
        } else {
            writeln!(f, "{}", self.title)?;
        }
        for (index, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {}. {}", index + 1, step)?;
        }
        Ok(())
    }
}

/// Factory for the proxy subcommands
#[derive(Debug, Clone)]
pub struct ProxyCommands {
    program_name: String,
    search_path: Option<OsString>,
}

impl ProxyCommands {
    /// Factory probing backends on the process `PATH`
    pub fn new(program_name: impl Into<String>) -> Self {
        Self {
            program_name: program_name.into(),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Probe backends on `search_path` instead of `PATH`
    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }
}

impl SubcommandFactory for ProxyCommands {
    fn install(&self) -> CommandNode {
        install::new_command(&self.program_name)
    }

    fn uninstall(&self) -> anyhow::Result<CommandNode> {
        let search_path = self
            .search_path
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("PATH is not set, cannot detect container backends"))?;
        let detected = Backend::detect(search_path);
        tracing::debug!("Detected backends: {:?}", detected);
        Ok(uninstall::new_command(&self.program_name, detected))
    }

    fn completion(&self) -> CommandNode {
        completion::new_command(&self.program_name)
    }
}

/// Path of an existing file passed as positional argument
fn existing_file(path: &Path) -> anyhow::Result<&Path> {
    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_backends_on_search_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("podman"), "").unwrap();

        let detected = Backend::detect(dir.path().as_os_str());
        assert_eq!(detected, vec![Backend::Podman]);
    }

    #[test]
    fn test_detect_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("kubectl")).unwrap();

        assert!(Backend::detect(dir.path().as_os_str()).is_empty());
    }

    #[test]
    fn test_uninstall_factory_fails_without_path() {
        let factory = ProxyCommands::new("mgrpxy").with_search_path(None);
        let err = factory.uninstall().unwrap_err();
        assert!(err.to_string().contains("PATH is not set"));
    }

    #[test]
    fn test_factory_command_names() {
        let dir = tempfile::tempdir().unwrap();
        let factory =
            ProxyCommands::new("mgrpxy").with_search_path(Some(dir.path().as_os_str().into()));

        assert_eq!(factory.install().name, "install");
        assert_eq!(factory.uninstall().unwrap().name, "uninstall");
        assert_eq!(factory.completion().name, crate::cli::COMPLETION_COMMAND);
    }

    #[test]
    fn test_plan_display() {
        let mut plan = Plan::new("Uninstalling proxy");
        plan.step("podman pod rm uyuni-proxy-pod");
        plan.dry_run = true;

        let text = plan.to_string();
        assert!(text.starts_with("Uninstalling proxy (dry run"));
        assert!(text.contains("  1. podman pod rm uyuni-proxy-pod"));
    }
}
