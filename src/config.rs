//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default so a partial (or missing) file still yields
//! a runnable paper-trading setup. Secrets are referenced by env-var name
//! and resolved at startup into a `SecretString`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::types::AgentError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub trading: TradingConfig,
    pub market_data: MarketDataConfig,
    pub execution: ExecutionConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Seconds between the end of one cycle and the start of the next.
    pub cycle_interval_secs: u64,
    /// Seconds to pause after a failed cycle.
    pub error_backoff_secs: u64,
    /// Upper bound on any single collaborator call.
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 300,
            error_backoff_secs: 60,
            request_timeout_secs: 30,
        }
    }
}

impl AgentConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Thresholds and sizing for the decision policy and executor.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TradingConfig {
    /// Candidates below this USD liquidity are never evaluated.
    pub min_liquidity_usd: Decimal,
    /// Hard cap on the USD value of a single position.
    pub max_position_size_usd: Decimal,
    /// Seed allocation per buy, capped by `max_position_size_usd`.
    pub initial_allocation_usd: Decimal,
    /// Buy when the 24h change is strictly above this percentage.
    pub buy_trigger_pct: Decimal,
    /// Sell when the 24h change is strictly below this percentage.
    pub sell_trigger_pct: Decimal,
    /// Close a held position once its move from entry reaches this (negative) percentage.
    pub stop_loss_pct: Decimal,
    /// Close a held position once its move from entry reaches this percentage.
    pub take_profit_pct: Decimal,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            min_liquidity_usd: dec!(1000),
            max_position_size_usd: dec!(100),
            initial_allocation_usd: dec!(50),
            buy_trigger_pct: dec!(10),
            sell_trigger_pct: dec!(-5),
            stop_loss_pct: dec!(-15),
            take_profit_pct: dec!(30),
        }
    }
}

impl TradingConfig {
    /// USD committed per buy.
    pub fn buy_amount_usd(&self) -> Decimal {
        self.max_position_size_usd.min(self.initial_allocation_usd)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedProvider {
    /// Fixed in-process token list (paper trading / demos).
    Static,
    /// JSON token list fetched over HTTP.
    Http,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarketDataConfig {
    pub provider: FeedProvider,
    pub base_url: String,
    /// Name of the env var holding the feed API key, if any.
    pub api_key_env: Option<String>,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            provider: FeedProvider::Static,
            base_url: "http://localhost:8080".to_string(),
            api_key_env: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Only mutate the ledger after the venue acknowledges the order.
    pub require_ack: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { require_ack: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 3030,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    /// Returns the config and whether the file was found.
    pub fn load_or_default(path: &str) -> Result<(Self, bool)> {
        if Path::new(path).exists() {
            Ok((Self::load(path)?, true))
        } else {
            Ok((Self::default(), false))
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Reject configurations the policy cannot run safely with.
    pub fn validate(&self) -> std::result::Result<(), AgentError> {
        let t = &self.trading;
        let positive = [
            ("min_liquidity_usd", t.min_liquidity_usd),
            ("max_position_size_usd", t.max_position_size_usd),
            ("initial_allocation_usd", t.initial_allocation_usd),
        ];
        for (name, value) in positive {
            if value <= Decimal::ZERO {
                return Err(AgentError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        if t.buy_trigger_pct <= t.sell_trigger_pct {
            return Err(AgentError::Config(format!(
                "buy_trigger_pct ({}) must be above sell_trigger_pct ({})",
                t.buy_trigger_pct, t.sell_trigger_pct
            )));
        }
        if t.stop_loss_pct >= Decimal::ZERO {
            return Err(AgentError::Config(format!(
                "stop_loss_pct must be negative, got {}",
                t.stop_loss_pct
            )));
        }
        if t.take_profit_pct <= Decimal::ZERO {
            return Err(AgentError::Config(format!(
                "take_profit_pct must be positive, got {}",
                t.take_profit_pct
            )));
        }

        let a = &self.agent;
        if a.cycle_interval_secs == 0 || a.error_backoff_secs == 0 || a.request_timeout_secs == 0 {
            return Err(AgentError::Config(
                "cycle_interval_secs, error_backoff_secs and request_timeout_secs must be non-zero".into(),
            ));
        }

        if self.market_data.provider == FeedProvider::Http && self.market_data.base_url.is_empty() {
            return Err(AgentError::Config("market_data.base_url is required for the http provider".into()));
        }

        Ok(())
    }

    /// Read a secret from the environment variable named in the config.
    /// Empty values count as unset.
    pub fn resolve_secret(env_name: &str) -> Result<SecretString> {
        let value = std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))?;
        if value.trim().is_empty() {
            anyhow::bail!("Environment variable is empty: {env_name}");
        }
        Ok(SecretString::new(value))
    }
}
