use {
    anyhow::Result,
    lingua_config::{Diagnostic, LinguaConfig, Severity, ValidationResult},
    lingua_routing::ModeRegistry,
    std::path::Path,
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// File diagnostics for `path` (or the discovered file) plus semantic checks
/// on the effective config when it loaded.
pub fn diagnose(path: Option<&Path>, config: Option<&LinguaConfig>) -> ValidationResult {
    let mut result = lingua_config::validate(path);
    if let Some(config) = config {
        result.diagnostics.extend(lingua_config::check_config(config));
    }
    result
}

/// Print diagnostics to stderr. Returns the number of errors.
pub fn report(result: &ValidationResult, verbose: bool) -> usize {
    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }
        eprintln!("  {}", render(d));
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
    errors
}

fn render(d: &Diagnostic) -> String {
    let color = match d.severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
        Severity::Info => CYAN,
    };
    if d.path.is_empty() {
        format!("{BOLD}{color}{}{RESET} {}", d.severity, d.message)
    } else {
        format!("{BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message)
    }
}

/// `lingua check`: exits non-zero when the config has errors.
pub fn check(path: Option<&Path>, config: Option<&LinguaConfig>, verbose: bool) -> Result<()> {
    let result = diagnose(path, config);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    if report(&result, verbose) > 0 || config.is_none() {
        std::process::exit(1);
    }
    Ok(())
}

/// `lingua modes`: print the effective catalog.
pub fn modes(config: &LinguaConfig) -> Result<()> {
    for line in mode_lines(&config.mode_registry()) {
        println!("{line}");
    }
    Ok(())
}

fn mode_lines(registry: &ModeRegistry) -> Vec<String> {
    let width = registry
        .iter()
        .map(|m| m.command.chars().count())
        .max()
        .unwrap_or_default();
    registry
        .iter()
        .map(|m| format!("{:<width$}  {:<28}  {}", m.command, m.mode.to_string(), m.text))
        .collect()
}
