//! Configuration validation engine.
//!
//! Detects unknown or misspelled fields in the config file and reports
//! settings the bot cannot start with.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use {
    lingua_routing::START_COMMAND,
    lingua_sessions::Mode,
};

use crate::{
    loader::{self, ConfigFormat},
    schema::LinguaConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "missing-secret",
    /// "invalid-value", "mode"
    pub category: &'static str,
    /// Dotted path, e.g. "telegram.tokn"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(category: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} [{}]: {}", self.severity, self.category, self.message)
        } else {
            write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.category, self.path, self.message
            )
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Represents the expected shape of the configuration schema.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// An array of typed items.
    Array(Box<KnownKeys>),
    /// Scalar value — stop recursion.
    Leaf,
}

/// Build the full schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    let mode_entry = Struct(HashMap::from([
        ("command", Leaf),
        ("text", Leaf),
        ("mode", Leaf),
        ("source_language", Leaf),
        ("target_language", Leaf),
    ]));

    Struct(HashMap::from([
        (
            "telegram",
            Struct(HashMap::from([
                ("token", Leaf),
                ("poll_timeout_secs", Leaf),
                ("register_commands", Leaf),
            ])),
        ),
        (
            "openai",
            Struct(HashMap::from([
                ("api_key", Leaf),
                ("base_url", Leaf),
                ("chat_model", Leaf),
                ("image_model", Leaf),
                ("image_size", Leaf),
            ])),
        ),
        (
            "voice",
            Struct(HashMap::from([(
                "stt",
                Struct(HashMap::from([
                    ("provider", Leaf),
                    ("model", Leaf),
                    ("api_key", Leaf),
                    ("base_url", Leaf),
                    ("language", Leaf),
                ])),
            )])),
        ),
        (
            "sessions",
            Struct(HashMap::from([("history_ttl_secs", Leaf)])),
        ),
        (
            "media",
            Struct(HashMap::from([
                ("max_dimension", Leaf),
                ("detail_threshold", Leaf),
            ])),
        ),
        (
            "messages",
            Struct(HashMap::from([
                ("welcome", Leaf),
                ("translation_prompt", Leaf),
                ("failure_notice", Leaf),
            ])),
        ),
        ("modes", Array(Box::new(mode_entry))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Find the best match for `needle` among `candidates` using Levenshtein
/// distance. Returns `Some(best)` if the distance is <= `max_distance`.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered config file
/// if `path` is `None`.
///
/// Covers the file itself (syntax, unknown fields, types); run
/// [`check_config`] on the loaded config for semantic checks.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => loader::find_config_file(),
    };

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    let format = match ConfigFormat::from_path(&actual_path) {
        Ok(format) => format,
        Err(e) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic::error("syntax", "", e.to_string())],
                config_path: Some(actual_path),
            };
        },
    };

    match std::fs::read_to_string(&actual_path) {
        Ok(content) => {
            let content = crate::env_subst::substitute_env(&content);
            let mut result = validate_str(&content, format);
            result.config_path = Some(actual_path);
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::error(
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: Some(actual_path),
        },
    }
}

/// Validate raw config text without file-system side effects.
#[must_use]
pub fn validate_str(raw: &str, format: ConfigFormat) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let value = match loader::parse_config_value(raw, format) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::error("syntax", "", format!("syntax error: {e}")));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    // 3. Types
    if let Err(e) = loader::parse_config(raw, format) {
        diagnostics.push(Diagnostic::error(
            "type-error",
            "",
            format!("type error: {e}"),
        ));
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Walk the value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (serde_json::Value::Object(table), KnownKeys::Struct(fields)) => {
            let mut known_keys: Vec<&str> = fields.keys().copied().collect();
            known_keys.sort_unstable();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                } else {
                    let level = if prefix.is_empty() {
                        "at top level "
                    } else {
                        ""
                    };
                    let msg = match suggest(key, &known_keys, 3) {
                        Some(s) => format!("unknown field {level}(did you mean \"{s}\"?)"),
                        None => format!("unknown field {level}"),
                    };
                    diagnostics.push(Diagnostic::error(
                        "unknown-field",
                        path,
                        msg.trim().to_string(),
                    ));
                }
            }
        },
        (serde_json::Value::Array(arr), KnownKeys::Array(item_schema)) => {
            for (i, item) in arr.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                check_unknown_fields(item, item_schema, &path, diagnostics);
            }
        },
        // Leaf or type mismatch — stop recursion (type errors caught later)
        _ => {},
    }
}

/// Semantic checks on the effective config, secrets from the environment
/// included.
#[must_use]
pub fn check_config(config: &LinguaConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if !config.telegram.has_token() {
        diagnostics.push(Diagnostic::error(
            "missing-secret",
            "telegram.token",
            "telegram bot token is not set (config or TELEGRAM_BOT_TOKEN)",
        ));
    }
    if !config.openai.has_api_key() {
        diagnostics.push(Diagnostic::error(
            "missing-secret",
            "openai.api_key",
            "OpenAI API key is not set (config, OPENAI_API_KEY_TELEGRAM or OPENAI_API_KEY)",
        ));
    }

    if config.sessions.history_ttl_secs == 0 {
        diagnostics.push(Diagnostic::error(
            "invalid-value",
            "sessions.history_ttl_secs",
            "history TTL must be greater than zero",
        ));
    }
    if config.media.max_dimension == 0 {
        diagnostics.push(Diagnostic::error(
            "invalid-value",
            "media.max_dimension",
            "max dimension must be greater than zero",
        ));
    }
    if config.media.detail_threshold > config.media.max_dimension {
        diagnostics.push(Diagnostic::error(
            "invalid-value",
            "media.detail_threshold",
            format!(
                "detail threshold {} exceeds max dimension {}",
                config.media.detail_threshold, config.media.max_dimension
            ),
        ));
    }
    if config.telegram.poll_timeout_secs == 0 {
        diagnostics.push(Diagnostic::warning(
            "invalid-value",
            "telegram.poll_timeout_secs",
            "zero timeout turns long polling into busy polling",
        ));
    }
    for (field, text) in [
        ("messages.welcome", &config.messages.welcome),
        ("messages.translation_prompt", &config.messages.translation_prompt),
        ("messages.failure_notice", &config.messages.failure_notice),
    ] {
        if text.trim().is_empty() {
            diagnostics.push(Diagnostic::error(
                "invalid-value",
                field,
                "text must not be empty",
            ));
        }
    }

    check_modes(config, &mut diagnostics);
    diagnostics
}

fn check_modes(config: &LinguaConfig, diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = HashSet::new();

    for (i, descriptor) in config.modes.iter().enumerate() {
        let path = format!("modes[{i}]");
        let command = descriptor.command.as_str();

        if !command.starts_with('/') {
            diagnostics.push(Diagnostic::error(
                "mode",
                format!("{path}.command"),
                format!("command \"{command}\" must start with '/'"),
            ));
        } else if !is_telegram_command(descriptor.command_name()) {
            diagnostics.push(Diagnostic::warning(
                "mode",
                format!("{path}.command"),
                format!(
                    "command \"{command}\" is not a valid Telegram command (1-32 of a-z, 0-9, _)"
                ),
            ));
        }
        if command == START_COMMAND {
            diagnostics.push(Diagnostic::error(
                "mode",
                format!("{path}.command"),
                "/start is reserved for the welcome message",
            ));
        }
        if !seen.insert(command) {
            diagnostics.push(Diagnostic::error(
                "mode",
                format!("{path}.command"),
                format!("duplicate command \"{command}\""),
            ));
        }
        if descriptor.text.trim().is_empty() {
            diagnostics.push(Diagnostic::warning(
                "mode",
                format!("{path}.text"),
                "empty text leaves the mode switch unacknowledged",
            ));
        }

        match &descriptor.mode {
            Mode::Unset => diagnostics.push(Diagnostic::error(
                "mode",
                format!("{path}.mode"),
                "mode must be translator, direct_chat or image_generation",
            )),
            Mode::Translator {
                source_language,
                target_language,
            } => {
                if source_language.trim().is_empty() || target_language.trim().is_empty() {
                    diagnostics.push(Diagnostic::error(
                        "mode",
                        path.clone(),
                        "translator mode needs source_language and target_language",
                    ));
                }
            },
            Mode::DirectChat | Mode::ImageGeneration => {},
        }
    }
}

/// Telegram accepts 1-32 lowercase letters, digits and underscores.
fn is_telegram_command(name: &str) -> bool {
    (1..=32).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
