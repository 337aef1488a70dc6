//! orbis-cli: operator tool over a local Orbis account database.
//!
//! Runs the same engine operations as the bot directly against the
//! RocksDB store, for inspection, administrative fixes and scripting.
//! Stop the bot first: RocksDB allows one process per database.
//!
//! Economy rules are read from the same `orbis.toml` and `ORBIS__*`
//! environment variables as the bot, so both apply identical rules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;

use orbis_core::{AccountId, Participant};
use orbis_economy::cooldown::minutes_seconds;
use orbis_economy::{DailyFortune, EconomyConfig, EconomyEngine};
use orbis_store::{RocksAccountStore, StoreConfig};

/// Orbis economy operator CLI.
#[derive(Parser, Debug)]
#[command(name = "orbis-cli", version, about = "Inspect and administer an Orbis account store")]
struct Cli {
    /// Data directory holding the account database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: <data-dir>/orbis.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable the daily fortune multiplier on work income
    #[arg(long, global = true)]
    no_fortune: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show an account's balance, level and activity.
    Balance(AccountArgs),
    /// Run the work action for an account.
    Work(AccountArgs),
    /// Transfer coins between two accounts.
    Pay(PayArgs),
    /// Override an account's balance.
    SetBalance(SetBalanceArgs),
    /// Record a chat message for an account.
    Message(MessageArgs),
    /// Show one page of the level leaderboard.
    Rank(RankArgs),
}

#[derive(Args, Debug)]
struct AccountArgs {
    /// Account id
    id: String,
}

#[derive(Args, Debug)]
struct PayArgs {
    /// Sender account id
    from: String,
    /// Recipient account id
    to: String,
    /// Amount to transfer
    #[arg(allow_hyphen_values = true)]
    amount: i64,
    /// Treat the recipient as an automated account
    #[arg(long)]
    to_bot: bool,
}

#[derive(Args, Debug)]
struct SetBalanceArgs {
    /// Account id
    id: String,
    /// New balance
    #[arg(allow_hyphen_values = true)]
    amount: i64,
}

#[derive(Args, Debug)]
struct MessageArgs {
    /// Author account id
    id: String,
    /// Message content
    content: String,
    /// Author is an automated account
    #[arg(long)]
    bot: bool,
}

#[derive(Args, Debug)]
struct RankArgs {
    /// Page number
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    page: i64,
}

/// The parts of the bot's configuration that shape engine behaviour.
/// Other keys in the file are ignored.
#[derive(Deserialize, Debug)]
#[serde(default)]
struct Settings {
    daily_fortune: bool,
    economy: EconomyConfig,
    store: StoreConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_fortune: true,
            economy: EconomyConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Settings {
    fn load(path: &Path) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("ORBIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let output = run(cli)?;
    println!("{output}");
    Ok(())
}

fn open_engine(cli: &Cli) -> Result<(EconomyEngine, Arc<RocksAccountStore>)> {
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| StoreConfig::default().data_dir);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| data_dir.join("orbis.toml"));
    let settings = Settings::load(&config_path)?;

    let mut store_config = settings.store;
    if cli.data_dir.is_some() {
        store_config.data_dir = data_dir;
    }
    std::fs::create_dir_all(&store_config.data_dir).with_context(|| {
        format!("Failed to create data dir {}", store_config.data_dir.display())
    })?;
    let store = Arc::new(RocksAccountStore::open_default(&store_config).with_context(|| {
        format!(
            "Failed to open account store at {}",
            store_config.db_path().display()
        )
    })?);

    let mut engine = EconomyEngine::new(store.clone(), settings.economy);
    if settings.daily_fortune && !cli.no_fortune {
        engine = engine.with_fortune(Arc::new(DailyFortune::new()));
    }
    Ok((engine, store))
}

/// Execute one command and render its output.
fn run(cli: Cli) -> Result<String> {
    let (engine, store) = open_engine(&cli)?;
    let now = Utc::now();

    let output = match &cli.command {
        Commands::Balance(args) => {
            let account = engine.balance(&AccountId::from(args.id.as_str()))?;
            if cli.json {
                serde_json::to_string_pretty(&account)?
            } else {
                format!(
                    "{}: balance {} | level {} ({:.0}/{:.0}) | activity {:.2}",
                    account.id,
                    account.balance,
                    account.level,
                    account.level_total(),
                    engine.next_level_threshold(&account),
                    account.activity_score
                )
            }
        }
        Commands::Work(args) => {
            let id = AccountId::from(args.id.as_str());
            match engine.work(&id, now) {
                Ok(out) if cli.json => serde_json::to_string_pretty(&out)?,
                Ok(out) => format!(
                    "{id} earned {} (fortune x{}), balance {}",
                    out.income, out.fortune_multiplier, out.account.balance
                ),
                Err(orbis_core::EconomyError::CooldownActive { remaining_secs }) => {
                    let (m, s) = minutes_seconds(remaining_secs);
                    anyhow::bail!("{id} can work again in {m}m {s}s");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Pay(args) => {
            let sender = Participant::human(args.from.as_str());
            let recipient = Participant {
                id: AccountId::from(args.to.as_str()),
                automated: args.to_bot,
            };
            let receipt = engine.transfer(&sender, &recipient, args.amount)?;
            if cli.json {
                serde_json::to_string_pretty(&receipt)?
            } else {
                format!(
                    "{} -> {}: {} (balances {} / {})",
                    receipt.sender.id,
                    receipt.recipient.id,
                    receipt.amount,
                    receipt.sender.balance,
                    receipt.recipient.balance
                )
            }
        }
        Commands::SetBalance(args) => {
            let account = engine.set_balance(&AccountId::from(args.id.as_str()), args.amount)?;
            if cli.json {
                serde_json::to_string_pretty(&account)?
            } else {
                format!("{}: balance set to {}", account.id, account.balance)
            }
        }
        Commands::Message(args) => {
            let author = Participant {
                id: AccountId::from(args.id.as_str()),
                automated: args.bot,
            };
            let outcome = engine.record_message(&author, &args.content, now)?;
            match outcome {
                Some(out) if cli.json => serde_json::to_string_pretty(&out)?,
                Some(out) => format!(
                    "{}: activity {:.2}, level {}, reward {}{}",
                    author.id,
                    out.activity_score,
                    out.level,
                    out.income,
                    if out.reset { " (reset)" } else { "" }
                ),
                None if cli.json => json!({ "qualified": false }).to_string(),
                None => "message ignored (too short or automated author)".to_string(),
            }
        }
        Commands::Rank(args) => {
            let page = engine.rank(args.page)?;
            if cli.json {
                serde_json::to_string_pretty(&page)?
            } else if page.is_empty() {
                "no ranking data".to_string()
            } else {
                let mut lines = vec![format!("Level ranking (page {}/{})", page.page, page.total_pages)];
                lines.extend(
                    page.entries
                        .iter()
                        .map(|e| format!("{:>4}. {}  Lv.{}", e.position, e.id, e.level)),
                );
                lines.join("\n")
            }
        }
    };

    store.flush()?;
    Ok(output)
}
