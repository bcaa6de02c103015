mod cli;
mod config;
mod storage;

use clap::Parser;
use color_eyre::Result;
use keychain_async::PooledClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Command, ConfigCommand};

const HEALTH_PROBE_KEY: &str = "health/probe";

/// Entry point: every storage call runs on the runtime's blocking pool since
/// keyring access may wait on the platform.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command {
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        command => {
            let client = PooledClient::current(storage::client_from_config(&config));
            run_storage_command(command, &client).await?
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("keychain {}", env!("CARGO_PKG_VERSION"));
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

async fn run_storage_command(command: Command, client: &PooledClient) -> Result<()> {
    match command {
        Command::Exists { key } => {
            let found = client.exists(&key).await?;
            println!("{}", if found { "yes" } else { "no" });
        }
        Command::Get { key } => {
            let value = client.get(&key).await?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Command::Put { key, value, system } => {
            if system {
                client.put_system(&key, value.as_bytes()).await?;
            } else {
                client.put(&key, value.as_bytes()).await?;
            }
            println!("Stored {key}");
        }
        Command::Health => {
            run_store_health(client).await?;
            println!("Storage: ok");
        }
        Command::Version | Command::Config(_) => {}
    }
    Ok(())
}

/// Round-trips a probe value through the configured backend.
async fn run_store_health(client: &PooledClient) -> Result<()> {
    let payload = b"ok";
    client.put_system(HEALTH_PROBE_KEY, payload).await?;
    if !client.exists(HEALTH_PROBE_KEY).await? {
        color_eyre::eyre::bail!("storage probe missing after write");
    }
    let round_trip = client.get(HEALTH_PROBE_KEY).await?;
    if round_trip != payload {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}
