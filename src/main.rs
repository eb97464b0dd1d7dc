//! Trader agent: autonomous threshold trading over a token feed.
//!
//! Entry point. Parses the agent identity from the command line, loads
//! configuration, initialises structured logging, wires the market feed
//! and execution venue into an agent, and runs the cycle driver until
//! Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use trader_agent::config::{self, FeedProvider};
use trader_agent::dashboard::{self, routes::DashboardState};
use trader_agent::engine::agent::{AgentIdentity, TraderAgent};
use trader_agent::engine::driver::CycleDriver;
use trader_agent::engine::executor::TradeExecutor;
use trader_agent::engine::scanner::OpportunityScanner;
use trader_agent::platforms::http_feed::HttpMarketFeed;
use trader_agent::platforms::paper::{PaperExecution, StaticMarketFeed};
use trader_agent::platforms::MarketData;
use trader_agent::strategy::{ExitRules, ThresholdPolicy};

const BANNER: &str = r#"
 _____              _
|_   _| __ __ _  __| | ___ _ __
  | || '__/ _` |/ _` |/ _ \ '__|
  | || | | (_| | (_| |  __/ |
  |_||_|  \__,_|\__,_|\___|_|

  Momentum trading agent v0.1.0
"#;

#[derive(Parser, Debug)]
#[command(name = "trader-agent", version, about = "Autonomous threshold trading agent")]
struct Cli {
    /// Agent identifier, used in logs and stats.
    agent_id: String,

    /// Wallet address the agent trades from.
    wallet: String,

    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    let (cfg, found) = config::AppConfig::load_or_default(&cli.config)?;

    init_logging();

    println!("{BANNER}");
    if !found {
        warn!(path = %cli.config, "Config file not found, using defaults");
    }
    cfg.validate().context("Invalid configuration")?;

    info!(
        agent_id = %cli.agent_id,
        wallet = %cli.wallet,
        interval_secs = cfg.agent.cycle_interval_secs,
        backoff_secs = cfg.agent.error_backoff_secs,
        buy_trigger = %cfg.trading.buy_trigger_pct,
        sell_trigger = %cfg.trading.sell_trigger_pct,
        buy_amount = %cfg.trading.buy_amount_usd(),
        "Trader agent starting up"
    );

    // -- Initialise components -------------------------------------------

    let timeout = cfg.agent.request_timeout();

    let feed: Box<dyn MarketData> = match cfg.market_data.provider {
        FeedProvider::Static => {
            info!("Using built-in static market feed");
            Box::new(StaticMarketFeed::demo())
        }
        FeedProvider::Http => {
            let api_key = match cfg.market_data.api_key_env.as_deref() {
                Some(env) => match config::AppConfig::resolve_secret(env) {
                    Ok(key) => Some(key),
                    Err(e) => {
                        warn!(error = %e, "Market feed API key unavailable, requests will be unauthenticated");
                        None
                    }
                },
                None => {
                    warn!("No market feed API key configured, requests will be unauthenticated");
                    None
                }
            };
            info!(base_url = %cfg.market_data.base_url, "Using HTTP market feed");
            Box::new(HttpMarketFeed::new(&cfg.market_data.base_url, api_key, timeout)?)
        }
    };

    let scanner = OpportunityScanner::new(feed, cfg.trading.min_liquidity_usd, timeout);
    let executor = TradeExecutor::new(
        Box::new(PaperExecution::new()),
        &cfg.trading,
        cfg.execution.require_ack,
        timeout,
    );

    let agent = TraderAgent::new(
        AgentIdentity::new(cli.agent_id, cli.wallet),
        scanner,
        ThresholdPolicy::from_config(&cfg.trading),
        ExitRules::from_config(&cfg.trading),
        executor,
    );

    let mut driver = CycleDriver::new(agent, cfg.agent.cycle_interval(), cfg.agent.error_backoff());

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(driver.agent().stats()));
        dashboard::spawn_dashboard(state.clone(), cfg.dashboard.port).await?;
        driver = driver.with_dashboard(state);
    }

    // -- Main loop -------------------------------------------------------

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received."),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, stopping"),
        }
        let _ = shutdown_tx.send(true);
    });

    info!("Press Ctrl+C to stop.");
    let agent = driver.run(shutdown_rx).await;

    let stats = agent.stats();
    info!(
        cycles = stats.cycle_count,
        trades = stats.trades_executed,
        pnl = format!("${:.2}", stats.total_realized_pnl),
        open_positions = stats.open_positions,
        "Trader agent shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trader_agent=info"));

    let json_logging = std::env::var("TRADER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
