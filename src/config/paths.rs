//! Location of the per-user configuration files

use std::path::PathBuf;

use directories::ProjectDirs;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "UYUNI_CONFIG_DIR";

const USER_DEFAULTS_FILE: &str = "defaults.yaml";

/// Per-user defaults file, read before the file given with `--config`
///
/// Lives in `UYUNI_CONFIG_DIR` when set, otherwise in the platform
/// configuration directory of `program` (`~/.config/<program>` on Linux).
/// Falls back to the working directory when no home directory is known.
pub fn user_defaults_path(program: &str) -> PathBuf {
    let dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => ProjectDirs::from("", "", program)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_default(),
    };
    dir.join(USER_DEFAULTS_FILE)
}
