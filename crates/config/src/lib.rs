//! Configuration loading, env substitution, and validation.
//!
//! Config files: `lingua.toml`, `lingua.yaml`/`lingua.yml`, or `lingua.json`,
//! searched in `./` then the user config directory.
//!
//! Supports `${ENV_VAR}` substitution in the raw file, and fills missing
//! secrets from `TELEGRAM_BOT_TOKEN`, `OPENAI_API_KEY_TELEGRAM` and
//! `OPENAI_API_KEY`.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{ConfigFormat, apply_env_overrides, config_dir, find_config_file, load, load_config},
    schema::{LinguaConfig, MediaConfig, MessagesConfig, OpenAiConfig, SessionsConfig},
    validate::{Diagnostic, Severity, ValidationResult, check_config, validate},
};
