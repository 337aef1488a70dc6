//! Bot configuration.
//!
//! Layers, lowest first: built-in defaults, an optional TOML file, then
//! `ORBIS__*` environment variables (`__` separates nested keys, e.g.
//! `ORBIS__ECONOMY__COOLDOWN__WINDOW_SECS=60`). Discord credentials are
//! read from their own variables and never from the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use orbis_economy::EconomyConfig;
use orbis_store::StoreConfig;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BotConfig {
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    /// Apply the per-day fortune multiplier to work income.
    pub daily_fortune: bool,
    /// Bearer token required on the message relay endpoint, if set.
    pub events_token: Option<String>,
    pub economy: EconomyConfig,
    pub store: StoreConfig,
    #[serde(skip)]
    pub discord: DiscordConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            daily_fortune: true,
            events_token: None,
            economy: EconomyConfig::default(),
            store: StoreConfig::default(),
            discord: DiscordConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscordConfig {
    /// Bot token (enables slash command registration).
    pub bot_token: Option<String>,
    /// Application Ed25519 public key, hex-encoded.
    pub public_key: Option<String>,
    pub app_id: Option<String>,
}

impl DiscordConfig {
    pub fn from_env() -> Self {
        Self {
            bot_token: std::env::var("DISCORD_BOT_TOKEN").ok(),
            public_key: std::env::var("DISCORD_PUBLIC_KEY").ok(),
            app_id: std::env::var("DISCORD_APPLICATION_ID").ok(),
        }
    }

    /// `(token, app_id)` when both are present.
    pub fn registration(&self) -> Option<(&str, &str)> {
        match (&self.bot_token, &self.app_id) {
            (Some(token), Some(app_id)) => Some((token, app_id)),
            _ => None,
        }
    }
}

impl BotConfig {
    /// Default config file location inside the default data directory.
    pub fn default_path() -> PathBuf {
        StoreConfig::default().data_dir.join("orbis.toml")
    }

    /// Load file and environment layers. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix("ORBIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let mut cfg: BotConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        cfg.discord = DiscordConfig::from_env();
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BotConfig::default();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert!(cfg.daily_fortune);
        assert!(cfg.events_token.is_none());
        assert_eq!(cfg.economy.cooldown.window_secs, 3600);
    }

    #[test]
    fn default_path_is_toml_in_data_dir() {
        let path = BotConfig::default_path();
        assert!(path.ends_with("orbis/orbis.toml"), "{path:?}");
    }

    #[test]
    fn file_overrides_nested_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orbis.toml");
        std::fs::write(
            &path,
            r#"
bind_addr = "0.0.0.0:9000"
daily_fortune = false

[economy.cooldown]
window_secs = 60

[economy.ranking]
page_size = 10

[store]
lock_timeout_ms = 250
"#,
        )
        .unwrap();

        let cfg = BotConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert!(!cfg.daily_fortune);
        assert_eq!(cfg.economy.cooldown.window_secs, 60);
        assert_eq!(cfg.economy.ranking.page_size, 10);
        assert_eq!(cfg.store.lock_timeout_ms, 250);
        // untouched sections keep their defaults
        assert_eq!(cfg.economy.reward.message_outcomes, 10);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BotConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg.economy.retry.max_attempts, 3);
    }

    #[test]
    fn registration_needs_token_and_app_id() {
        let mut discord = DiscordConfig {
            bot_token: Some("t".into()),
            ..DiscordConfig::default()
        };
        assert!(discord.registration().is_none());
        discord.app_id = Some("42".into());
        assert_eq!(discord.registration(), Some(("t", "42")));
    }
}
