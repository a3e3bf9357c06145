//! Config file resolution.
//!
//! Order: explicit path → `PD_CONFIG` → `$XDG_CONFIG_HOME/prevalence-digest/config.json`
//! → built-in defaults. An explicit or env path that cannot be read is an
//! error; a missing XDG file silently falls back to defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::digest::DigestConfig;
use crate::validate::ValidationResult;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PD_CONFIG";

const CONFIG_DIR_NAME: &str = "prevalence-digest";
const CONFIG_FILE_NAME: &str = "config.json";

/// Where the effective config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Env(PathBuf),
    Xdg(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Explicit(p) => write!(f, "{} (--config)", p.display()),
            ConfigSource::Env(p) => write!(f, "{} (${})", p.display(), CONFIG_ENV),
            ConfigSource::Xdg(p) => write!(f, "{}", p.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolve and validate the effective config from the process environment.
pub fn resolve_config(explicit: Option<&Path>) -> ValidationResult<(DigestConfig, ConfigSource)> {
    let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let xdg_dir = dirs::config_dir();
    resolve_config_from(explicit, env_path, xdg_dir)
}

/// Resolution with the environment supplied by the caller.
pub fn resolve_config_from(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    xdg_dir: Option<PathBuf>,
) -> ValidationResult<(DigestConfig, ConfigSource)> {
    let (config, source) = if let Some(path) = explicit {
        (
            DigestConfig::from_file(path)?,
            ConfigSource::Explicit(path.to_path_buf()),
        )
    } else if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        (DigestConfig::from_file(&path)?, ConfigSource::Env(path))
    } else {
        match xdg_dir
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .filter(|path| path.is_file())
        {
            Some(path) => (DigestConfig::from_file(&path)?, ConfigSource::Xdg(path)),
            None => (DigestConfig::default(), ConfigSource::Defaults),
        }
    };

    config.validate()?;
    Ok((config, source))
}
