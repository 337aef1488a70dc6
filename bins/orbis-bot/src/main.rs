//! orbis-bot: Discord economy bot over HTTP interactions.
//!
//! Serves `/discord/interactions` for the `/balance`, `/work`, `/pay`,
//! `/setbalance` and `/rank` slash commands, `/api/events/message` for a
//! gateway relay that forwards chat messages, and `/api/status`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

mod commands;
mod discord;
mod routes;
mod settings;

use orbis_core::{AccountStore, MemoryAccountStore};
use orbis_economy::{DailyFortune, EconomyEngine};
use orbis_store::RocksAccountStore;
use settings::BotConfig;

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EconomyEngine>,
    pub config: Arc<BotConfig>,
}

#[derive(Parser, Debug)]
#[command(
    name = "orbis-bot",
    version,
    about = "Orbis economy bot: Discord HTTP interactions and message relay"
)]
struct Args {
    /// Configuration file (TOML); defaults to <data_dir>/orbis.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP bind address, overrides the config file
    #[arg(long)]
    bind: Option<String>,

    /// Data directory for the account database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Keep accounts in memory only (nothing is persisted)
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, &args.log_format);

    let mut config = BotConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(data_dir) = args.data_dir {
        config.store.data_dir = data_dir;
    }

    info!("Orbis bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        bind = %config.bind_addr,
        data_dir = %config.store.data_dir.display(),
        memory = args.memory,
        daily_fortune = config.daily_fortune,
        "starting"
    );

    let rocks = if args.memory {
        None
    } else {
        std::fs::create_dir_all(&config.store.data_dir).with_context(|| {
            format!("Failed to create data dir {}", config.store.data_dir.display())
        })?;
        let store = RocksAccountStore::open_default(&config.store)
            .context("Failed to open account store")?;
        Some(Arc::new(store))
    };
    let store: Arc<dyn AccountStore> = match &rocks {
        Some(rocks) => rocks.clone() as Arc<dyn AccountStore>,
        None => Arc::new(MemoryAccountStore::new()),
    };

    let mut engine = EconomyEngine::new(store, config.economy.clone());
    if config.daily_fortune {
        engine = engine.with_fortune(Arc::new(DailyFortune::new()));
    }

    if let Some((token, app_id)) = config.discord.registration() {
        match discord::register_commands(token, app_id).await {
            Ok(()) => info!("Discord slash commands registered"),
            Err(e) => warn!("Failed to register Discord commands: {e}"),
        }
    }
    if config.discord.public_key.is_none() {
        warn!("DISCORD_PUBLIC_KEY not set; /discord/interactions will return 404");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        engine: Arc::new(engine),
        config: Arc::new(config),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    info!("Listening on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Some(rocks) = rocks {
        rocks.flush().context("Failed to flush account store")?;
    }
    info!("Orbis bot shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down...");
}

/// Initialize tracing with the given level and output format.
///
/// `RUST_LOG` takes precedence over `level_str` when set. Pass
/// `format = "json"` for structured output; anything else is text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
