//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{paths, schema::ProxyConfig};
use crate::cli::GlobalConfig;
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Prefix of the environment variables overriding configuration keys
pub const ENV_PREFIX: &str = "UYUNI_";

/// Environment variable suffixes and the key path they override
const ENV_OVERRIDES: &[(&str, &[&str])] = &[
    ("REGISTRY", &["registry"]),
    ("TAG", &["tag"]),
    ("PULLPOLICY", &["pullPolicy"]),
    ("KUBERNETES_NAMESPACE", &["kubernetes", "namespace"]),
];

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. File passed with `--config`
    /// 3. Per-user defaults file
    /// 4. Built-in defaults
    ///
    /// Command line flags are applied on top by the commands themselves.
    pub fn load(global: &GlobalConfig, program: &str) -> Result<ProxyConfig> {
        Self::load_with(global, &paths::user_defaults_path(program), |key| {
            std::env::var(key).ok()
        })
    }

    /// Same as [`ConfigLoader::load`] with an explicit defaults file and environment
    pub fn load_with<F>(global: &GlobalConfig, user_defaults: &Path, env: F) -> Result<ProxyConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged = Value::Mapping(Mapping::new());

        if user_defaults.exists() {
            merge_values(&mut merged, Self::load_value(user_defaults)?);
        }

        if !global.config_path.is_empty() {
            let path = Path::new(&global.config_path);
            if !path.exists() {
                return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
            }
            merge_values(&mut merged, Self::load_value(path)?);
        }

        apply_env_overrides(&mut merged, env);

        let config: ProxyConfig =
            serde_yaml::from_value(merged).context("Invalid proxy configuration")?;
        tracing::debug!(
            "Configuration loaded: registry={}, tag={}",
            config.registry,
            config.tag
        );
        Ok(config)
    }

    /// Load a YAML document from a file
    pub fn load_value(path: &Path) -> Result<Value> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let value: Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        match value {
            Value::Mapping(_) | Value::Null => Ok(value),
            _ => Err(anyhow::anyhow!(
                "Config file must contain a YAML mapping: {}",
                path.display()
            )),
        }
    }
}

/// Deep merge `other` into `base`, with `other` taking precedence
pub fn merge_values(base: &mut Value, other: Value) {
    match (base, other) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(other_map)) => {
            for (key, value) in other_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, other) => *base = other,
    }
}

/// Apply `UYUNI_*` overrides looked up through `env`
fn apply_env_overrides<F>(config: &mut Value, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (suffix, key_path) in ENV_OVERRIDES {
        let Some(value) = env(&format!("{ENV_PREFIX}{suffix}")) else {
            continue;
        };
        let mut override_value = Value::String(value);
        for key in key_path.iter().rev() {
            let mut mapping = Mapping::new();
            mapping.insert(Value::String(key.to_string()), override_value);
            override_value = Value::Mapping(mapping);
        }
        merge_values(config, override_value);
    }
}
