//! Configuration system for the proxy commands
//!
//! Values come from built-in defaults, a per-user defaults file, the file
//! named by `--config` and `UYUNI_*` environment variables, in increasing
//! order of precedence.

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{KubernetesConfig, PodmanConfig, ProxyConfig};
