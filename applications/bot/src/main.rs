//! Chorus Bot - shared listening session on the console
use chorus_bot::{Bot, BotConfig};
use chorus_core::SessionExit;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chorus-bot")]
#[command(about = "Shared listening session with a vote-driven queue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the session on this console
    Run {
        /// Configuration file path (default: ./chorus.toml)
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Validate the configuration and print the effective values
    CheckConfig {
        /// Configuration file path (default: ./chorus.toml)
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus_bot=info,chorus_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            run(config).await?;
        }
        Commands::CheckConfig { config } => {
            check_config(config)?;
        }
    }

    Ok(())
}

async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = BotConfig::load(config_path.as_deref())?;
    config.validate()?;

    tracing::info!("Starting Chorus Bot");
    tracing::info!("Session: {}", config.session.name);
    tracing::info!("Media cache: {}", config.cache_directory().display());

    match Bot::new(config, config_path).run().await? {
        SessionExit::Killed => tracing::info!("Kill successful. Goodbye!"),
        SessionExit::Closed => tracing::info!("Input closed, session ended"),
    }

    Ok(())
}

fn check_config(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = BotConfig::load(config_path.as_deref())?;
    config.validate()?;

    println!("{}", toml::to_string_pretty(&config)?);
    tracing::info!("Configuration is valid");
    Ok(())
}
