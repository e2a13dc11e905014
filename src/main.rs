use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use launchpad_service::api::{JupiterClient, PinataClient};
use launchpad_service::cli::Cli;
use launchpad_service::config::Config;
use launchpad_service::db::TokenRepository;
use launchpad_service::feed::{FeedStore, FeedStream};
use launchpad_service::rewards::RewardAggregator;
use launchpad_service::solana::cp_amm::CpAmmClient;
use launchpad_service::solana::dbc::DbcClient;
use launchpad_service::solana::RpcClient;
use launchpad_service::web::{AppState, WebServer};
use launchpad_service::{logging, metrics};

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::load(&default_path)
                    .with_context(|| format!("Failed to load configuration from {:?}", default_path))?
            } else {
                warn!("No configuration file at {}, using defaults", DEFAULT_CONFIG_PATH);
                Config::default()
            }
        }
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Info };
    match &cli.log_file {
        Some(path) => logging::init(path, level)?,
        None => env_logger::Builder::from_default_env().filter_level(level).init(),
    }

    info!("Starting launchpad service...");
    let config = load_config(cli.config)?;
    info!("Configuration loaded successfully.");

    metrics::init()?;

    let partner_configs = config.feed.partner_configs.clone();
    let jupiter = Arc::new(JupiterClient::new(&config.jupiter, partner_configs)?);
    let store = Arc::new(FeedStore::new(config.feed.priority_token.clone()));

    let rpc = match &config.solana.rpc_url {
        Some(url) => Some(Arc::new(RpcClient::new(url.clone()))),
        None => {
            error!("RPC_URL is not set; rewards and transaction forwarding are disabled");
            None
        }
    };
    let rewards = match &rpc {
        Some(rpc) => RewardAggregator::new(
            Arc::new(DbcClient::new(rpc.clone())),
            Arc::new(CpAmmClient::new(rpc.clone())),
        ),
        None => RewardAggregator::unconfigured(),
    };

    let mut state = AppState::new(store.clone(), jupiter.clone(), rewards);
    if let Some(rpc) = rpc {
        state = state.with_transactions(rpc, Duration::from_secs(config.solana.confirm_timeout_secs));
    }
    match &config.database.url {
        Some(url) => match TokenRepository::connect(url, config.database.max_connections).await {
            Ok(repo) => state = state.with_tokens(Arc::new(repo)),
            Err(e) => error!("Database unavailable, my-tokens route disabled: {}", e),
        },
        None => warn!("DATABASE_URL is not set; my-tokens route disabled"),
    }
    if config.pinata.jwt.is_some() || config.pinata.api_key.is_some() {
        state = state.with_uploader(Arc::new(PinataClient::new(config.pinata.clone())?));
    } else {
        warn!("Pinata credentials are not set; uploads disabled");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let initial_store = store.clone();
    let initial_jupiter = jupiter.clone();
    tokio::spawn(async move {
        let pools = initial_jupiter.fetch_initial_pools().await;
        initial_store.load_initial(pools).await;
    });

    let stream_handle = if cli.no_stream {
        info!("Live stream disabled by --no-stream");
        None
    } else {
        let stream = FeedStream::new(config.feed.clone(), store.clone());
        Some(tokio::spawn(stream.run(shutdown_rx.clone())))
    };

    let server = WebServer::new(state);
    let server_handle = {
        let server_config = config.server.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { server.start(&server_config, shutdown).await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");
    shutdown_tx.send(true).ok();

    if let Some(handle) = stream_handle {
        handle.await.ok();
    }
    match server_handle.await {
        Ok(Err(e)) => error!("Web server error: {}", e),
        Err(e) => error!("Web server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    info!("Launchpad service stopped.");
    Ok(())
}
