use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use userdesk::cli::{self, Cli, Commands, ConfigCommands};
use userdesk::config::Config;
use userdesk::Console;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config check reports its own parse errors
    if let Some(Commands::Config(ConfigCommands::Check)) = &cli.command {
        return cli::cmd_config_check(&cli);
    }

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    cli.apply_overrides(&mut config);

    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting userdesk v{}", env!("CARGO_PKG_VERSION"));

    let console = Console::from_config(config).context("Failed to set up API client")?;

    cli::run_command(&cli, &console).await
}
