//! Configuration schema definitions
//!
//! Keys match the install flag names: `--pullPolicy` is `pullPolicy`,
//! `--kubernetes-namespace` is `kubernetes.namespace` and `--podman-arg` is
//! `podman.arg`. Unknown keys are rejected.

use serde::{Deserialize, Serialize};

/// Settings read by the install and uninstall commands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProxyConfig {
    /// Registry hosting the proxy images
    #[serde(default = "default_registry")]
    pub registry: String,

    /// Image tag
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Image pull policy (Always, IfNotPresent, Never)
    #[serde(default = "default_pull_policy")]
    pub pull_policy: String,

    #[serde(default)]
    pub kubernetes: KubernetesConfig,

    #[serde(default)]
    pub podman: PodmanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KubernetesConfig {
    /// Namespace the proxy is deployed to
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PodmanConfig {
    /// Extra arguments passed to `podman pod create`
    #[serde(
        default,
        rename = "arg",
        alias = "args",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub args: Vec<String>,
}

fn default_registry() -> String {
    "registry.opensuse.org/uyuni".to_string()
}

fn default_tag() -> String {
    "latest".to_string()
}

fn default_pull_policy() -> String {
    "IfNotPresent".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            tag: default_tag(),
            pull_policy: default_pull_policy(),
            kubernetes: KubernetesConfig::default(),
            podman: PodmanConfig::default(),
        }
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}
