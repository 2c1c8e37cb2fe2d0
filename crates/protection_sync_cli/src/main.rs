use clap::Parser;
use protection_sync_cli::{
    cli::Cli,
    commands::sync_cmd,
    config::{AppConfig, RunOptions},
    errors::Error,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `protection_sync_core=debug`.
const LOG_FILTER_ENV: &str = "PROTECTION_SYNC_LOG";

async fn run(cli: Cli) -> Result<(), Error> {
    let config = cli.config.as_deref().map(AppConfig::load).transpose()?;
    let options = RunOptions::resolve(&cli, config)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling the remaining repositories");
                cancel.cancel();
            }
        }
    });

    let report = sync_cmd::execute(&options, &cancel).await?;
    println!("{}", sync_cmd::summary(&report));
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Error: {e}");
        std::process::exit(1);
    }
}
