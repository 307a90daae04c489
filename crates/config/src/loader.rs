use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info},
};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::LinguaConfig,
};

/// Standard config file names, checked in order.
pub const CONFIG_FILENAMES: &[&str] = &["lingua.toml", "lingua.yaml", "lingua.yml", "lingua.json"];

/// Bot token variable.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// API key variables, in order of preference.
pub const OPENAI_KEY_ENVS: &[&str] = &["OPENAI_API_KEY_TELEGRAM", "OPENAI_API_KEY"];

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Format from the file extension; files without one are read as TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        match ext {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(Error::message(format!("unsupported config format: .{ext}"))),
        }
    }
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<LinguaConfig> {
    let raw = read_raw(path)?;
    parse_config(&raw, ConfigFormat::from_path(path)?)
}

/// Load and parse the file into a generic JSON tree, with env substitution.
pub fn load_config_value(path: &Path) -> Result<serde_json::Value> {
    let raw = read_raw(path)?;
    parse_config_value(&raw, ConfigFormat::from_path(path)?)
}

fn read_raw(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(substitute_env(&raw))
}

/// Load the effective configuration.
///
/// Uses `explicit` when given, otherwise the first discovered file, otherwise
/// defaults. Environment overrides are applied last. Returns the config and
/// the file it came from.
pub fn load(explicit: Option<&Path>) -> Result<(LinguaConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let config = match &path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(path)?
        },
        None => {
            info!("no config file found, using defaults");
            LinguaConfig::default()
        },
    };

    Ok((apply_env_overrides(config), path))
}

/// Find the first config file in standard locations.
///
/// Search order:
/// 1. `./lingua.{toml,yaml,yml,json}` (project-local)
/// 2. `<user config dir>/lingua.{toml,yaml,yml,json}` (user-global)
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/lingua/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "lingua").map(|d| d.config_dir().to_path_buf())
}

/// Fill secrets the file left empty from the process environment.
#[must_use]
pub fn apply_env_overrides(config: LinguaConfig) -> LinguaConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

pub(crate) fn apply_env_overrides_with(
    mut config: LinguaConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> LinguaConfig {
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if !config.telegram.has_token()
        && let Some(token) = lookup(TELEGRAM_TOKEN_ENV)
    {
        debug!(var = TELEGRAM_TOKEN_ENV, "telegram token taken from environment");
        config.telegram.token = Secret::new(token);
    }

    if !config.openai.has_api_key()
        && let Some((var, key)) = OPENAI_KEY_ENVS
            .iter()
            .find_map(|var| lookup(var).map(|key| (*var, key)))
    {
        debug!(var, "openai api key taken from environment");
        config.openai.api_key = Some(Secret::new(key));
    }

    config
}

pub(crate) fn parse_config(raw: &str, format: ConfigFormat) -> Result<LinguaConfig> {
    match format {
        ConfigFormat::Toml => Ok(toml::from_str(raw)?),
        ConfigFormat::Yaml => Ok(serde_yaml::from_str(raw)?),
        ConfigFormat::Json => Ok(serde_json::from_str(raw)?),
    }
}

pub(crate) fn parse_config_value(raw: &str, format: ConfigFormat) -> Result<serde_json::Value> {
    match format {
        ConfigFormat::Toml => {
            let v: toml::Value = toml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        ConfigFormat::Yaml => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw)?;
            Ok(serde_json::to_value(v)?)
        },
        ConfigFormat::Json => Ok(serde_json::from_str(raw)?),
    }
}
