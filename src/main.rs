//! Media Monitor entry point.

use std::{process, sync::Arc};

use clap::Parser;
use media_monitor::{
    Monitor, MonitorError, Result,
    cli::{
        Cli, config_schema,
        formatting::{format_banner, format_error},
        render_config,
    },
    services::media::MprisProvider,
    tracing_config,
};
use tracing::{Level, error, info, span};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{e}");
        eprintln!("{}", format_error(&e.to_string()));
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.config_schema {
        println!("{}", config_schema()?);
        return Ok(());
    }

    let config = cli.load_config()?;

    if cli.dump_config {
        println!("{}", render_config(&config)?);
        return Ok(());
    }

    let _log_guard = tracing_config::init(config.general.log_level, !config.display.enabled)
        .map_err(|e| MonitorError::Logging(e.to_string()))?;
    let _span = span!(Level::INFO, "media_monitor").entered();
    info!("Starting media monitor");

    let provider = MprisProvider::connect(config.media.clone()).await?;
    let monitor = Monitor::start(&config, Arc::new(provider.clone())).await?;

    if !config.display.enabled {
        if let Some(address) = monitor.local_addr() {
            println!("{}", format_banner(&address.to_string()));
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    monitor.stop().await;
    provider.shutdown().await;

    Ok(())
}
