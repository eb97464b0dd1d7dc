//! Full-cycle scenarios driven through the public API.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use trader_agent::config::TradingConfig;
use trader_agent::engine::agent::{AgentIdentity, TraderAgent};
use trader_agent::engine::driver::CycleDriver;
use trader_agent::engine::executor::TradeExecutor;
use trader_agent::engine::scanner::OpportunityScanner;
use trader_agent::platforms::paper::PaperExecution;
use trader_agent::platforms::OrderExecution;
use trader_agent::strategy::{ExitRules, ThresholdPolicy};
use trader_agent::types::{ExecutionError, ExitReason, OrderAck, TradeSide};

use crate::mock_market::{token, MockMarket};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Lets a test keep a handle on the paper venue after boxing it.
struct SharedVenue(Arc<PaperExecution>);

#[async_trait]
impl OrderExecution for SharedVenue {
    async fn submit_order(
        &self,
        asset_id: &str,
        side: TradeSide,
        amount: Decimal,
    ) -> Result<OrderAck, ExecutionError> {
        self.0.submit_order(asset_id, side, amount).await
    }

    fn is_paper(&self) -> bool {
        true
    }
}

fn build_agent(market: &MockMarket, venue: Arc<PaperExecution>) -> TraderAgent {
    let trading = TradingConfig::default();
    TraderAgent::new(
        AgentIdentity::new("42", "0xabc"),
        OpportunityScanner::new(Box::new(market.clone()), trading.min_liquidity_usd, TIMEOUT),
        ThresholdPolicy::from_config(&trading),
        ExitRules::from_config(&trading),
        TradeExecutor::new(Box::new(SharedVenue(venue)), &trading, true, TIMEOUT),
    )
}

#[tokio::test]
async fn test_momentum_buy_then_signal_sell() {
    let market = MockMarket::with_listing(vec![token("0xa", dec!(0.5), dec!(15.5), dec!(2000))]);
    let venue = Arc::new(PaperExecution::new());
    let mut agent = build_agent(&market, venue.clone());
    let (_tx, rx) = watch::channel(false);

    // Cycle 1: +15.5% with no holding opens 50 / 0.5 = 100 units.
    let report = agent.run_cycle(&rx).await.unwrap();
    assert_eq!(report.buys(), 1);
    let position = agent.ledger().get("0xa").unwrap();
    assert_eq!(position.amount, dec!(100));
    assert_eq!(position.entry_price, dec!(0.5));

    // Cycle 2: price falls to 0.45, change -5.5% → sell at a 5.00 loss.
    market.set_listing(vec![token("0xa", dec!(0.45), dec!(-5.5), dec!(2000))]);
    let report = agent.run_cycle(&rx).await.unwrap();
    assert_eq!(report.sells(), 1);
    assert_eq!(report.cycle_pnl, dec!(-5));
    assert_eq!(report.trades[0].exit_reason, Some(ExitReason::Signal));
    assert!(!agent.ledger().has_position("0xa"));

    let stats = agent.stats();
    assert_eq!(stats.trades_executed, 2);
    assert_eq!(stats.total_realized_pnl, dec!(-5));
    assert_eq!(stats.open_positions, 0);
    assert_eq!(stats.cycle_count, 2);
    assert_eq!(venue.fills().len(), 2);
}

#[tokio::test]
async fn test_illiquid_asset_never_traded() {
    let market = MockMarket::with_listing(vec![token("0xthin", dec!(1), dec!(42), dec!(500))]);
    let venue = Arc::new(PaperExecution::new());
    let mut agent = build_agent(&market, venue.clone());
    let (_tx, rx) = watch::channel(false);

    let report = agent.run_cycle(&rx).await.unwrap();
    assert_eq!(report.assets_listed, 1);
    assert_eq!(report.candidates, 0);
    assert_eq!(report.holds, 0);
    assert!(report.trades.is_empty());
    assert!(agent.ledger().is_empty());
    assert!(venue.fills().is_empty());
}

#[tokio::test]
async fn test_stop_loss_closes_quiet_position() {
    let market = MockMarket::with_listing(vec![token("0xa", dec!(0.5), dec!(12), dec!(2000))]);
    let mut agent = build_agent(&market, Arc::new(PaperExecution::new()));
    let (_tx, rx) = watch::channel(false);
    agent.run_cycle(&rx).await.unwrap();

    // Flat 24h change holds on signal, but -20% from entry hits the stop.
    market.set_listing(vec![token("0xa", dec!(0.4), dec!(0), dec!(2000))]);
    let report = agent.run_cycle(&rx).await.unwrap();
    assert_eq!(report.holds, 1);
    assert_eq!(report.sells(), 1);
    assert_eq!(report.trades[0].exit_reason, Some(ExitReason::StopLoss));
    assert_eq!(report.trades[0].realized_pnl, dec!(-10));
    assert!(agent.ledger().is_empty());
}

#[tokio::test]
async fn test_venue_outage_recorded_and_retried() {
    let market = MockMarket::with_listing(vec![token("0xa", dec!(0.5), dec!(15.5), dec!(2000))]);
    let venue = Arc::new(PaperExecution::new());
    let mut agent = build_agent(&market, venue.clone());
    let (_tx, rx) = watch::channel(false);

    venue.set_rejecting(true);
    let report = agent.run_cycle(&rx).await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].side, TradeSide::Buy);
    assert!(agent.ledger().is_empty());
    assert_eq!(agent.stats().trades_executed, 0);

    venue.set_rejecting(false);
    let report = agent.run_cycle(&rx).await.unwrap();
    assert_eq!(report.buys(), 1);
    assert!(agent.ledger().has_position("0xa"));
}

#[tokio::test]
async fn test_feed_failure_aborts_cycle() {
    let market = MockMarket::with_listing(vec![token("0xa", dec!(0.5), dec!(15.5), dec!(2000))]);
    market.set_error("503 Service Unavailable");
    let mut agent = build_agent(&market, Arc::new(PaperExecution::new()));
    let (_tx, rx) = watch::channel(false);

    let err = agent.run_cycle(&rx).await.unwrap_err();
    assert!(err.to_string().contains("503"));
    assert!(agent.ledger().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_driver_survives_feed_outage() {
    let market = MockMarket::with_listing(vec![token("0xa", dec!(0.5), dec!(15.5), dec!(2000))]);
    market.set_error("connection refused");
    let agent = build_agent(&market, Arc::new(PaperExecution::new()));
    let driver = CycleDriver::new(agent, Duration::from_secs(300), Duration::from_secs(60));

    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(driver.run(rx));

    // Failures at t=0 and t=60; the feed recovers before the t=120 retry.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(market.calls(), 2);
    market.clear_error();

    tokio::time::sleep(Duration::from_secs(70)).await;
    tx.send(true).unwrap();
    let agent = handle.await.unwrap();

    assert_eq!(market.calls(), 3);
    assert_eq!(agent.cycle_count(), 3);
    assert!(agent.ledger().has_position("0xa"));
    assert_eq!(agent.stats().trades_executed, 1);
}
