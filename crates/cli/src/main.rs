mod app;
mod config_commands;

use {
    clap::{Parser, Subcommand},
    std::path::PathBuf,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "lingua", about = "Lingua — Telegram translator, chat and image bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (overrides discovery of ./lingua.toml and the user config dir).
    #[arg(long, global = true, env = "LINGUA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default when no subcommand is provided).
    Run,
    /// Validate the configuration and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// List the effective mode commands.
    Modes,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let loaded = lingua_config::load(cli.config.as_deref());

    match cli.command {
        None | Some(Commands::Run) => {
            let (config, source) = loaded?;
            info!(
                version = env!("CARGO_PKG_VERSION"),
                config = ?source,
                "lingua starting"
            );
            let result = config_commands::diagnose(source.as_deref(), Some(&config));
            if config_commands::report(&result, false) > 0 {
                anyhow::bail!("configuration has errors; run `lingua check` for details");
            }
            app::run(config).await
        },
        Some(Commands::Check { verbose }) => {
            let (config, source) = match loaded {
                Ok((config, source)) => (Some(config), source),
                Err(e) => {
                    eprintln!("failed to load config: {e}\n");
                    (None, cli.config.clone())
                },
            };
            config_commands::check(source.as_deref(), config.as_ref(), verbose)
        },
        Some(Commands::Modes) => config_commands::modes(&loaded?.0),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["lingua"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.json_logs);
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "lingua",
            "check",
            "--verbose",
            "--config",
            "/etc/lingua.toml",
            "--json-logs",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Check { verbose: true })));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/lingua.toml")));
        assert!(cli.json_logs);
    }
}
