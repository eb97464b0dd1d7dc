//! Paper-trading collaborators.
//!
//! `StaticMarketFeed` serves a fixed token list and `PaperExecution`
//! acknowledges orders without touching any venue. Together they let the
//! agent run end-to-end with no network access.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::info;

use super::{MarketData, OrderExecution};
use crate::types::{AssetSnapshot, DataSourceError, ExecutionError, OrderAck, TradeSide};

const FEED_NAME: &str = "static";

/// Acknowledgements kept in the fill log; older ones are dropped.
const FILL_LOG_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// Static market feed
// ---------------------------------------------------------------------------

pub struct StaticMarketFeed {
    assets: Vec<AssetSnapshot>,
}

impl StaticMarketFeed {
    pub fn new(assets: Vec<AssetSnapshot>) -> Self {
        Self { assets }
    }

    /// Built-in demo listing: one momentum token, one falling token and
    /// one below the default liquidity floor.
    pub fn demo() -> Self {
        Self::new(vec![
            AssetSnapshot {
                id: "0x1234".to_string(),
                name: "AgentToken".to_string(),
                price: dec!(0.5),
                volume_24h: dec!(5000),
                liquidity: dec!(2000),
                price_change_24h: dec!(15.5),
            },
            AssetSnapshot {
                id: "0x5678".to_string(),
                name: "MoltCoin".to_string(),
                price: dec!(0.012),
                volume_24h: dec!(12000),
                liquidity: dec!(8000),
                price_change_24h: dec!(-7.2),
            },
            AssetSnapshot {
                id: "0x9abc".to_string(),
                name: "TinyPool".to_string(),
                price: dec!(2.4),
                volume_24h: dec!(300),
                liquidity: dec!(500),
                price_change_24h: dec!(42.0),
            },
        ])
    }
}

#[async_trait]
impl MarketData for StaticMarketFeed {
    async fn list_assets(&self) -> Result<Vec<AssetSnapshot>, DataSourceError> {
        Ok(self.assets.clone())
    }

    fn name(&self) -> &str {
        FEED_NAME
    }
}

// ---------------------------------------------------------------------------
// Paper execution
// ---------------------------------------------------------------------------

/// Simulated venue. Every order is acknowledged unless `set_rejecting`
/// has been switched on. Keeps the most recent fills for inspection.
#[derive(Default)]
pub struct PaperExecution {
    rejecting: AtomicBool,
    fills: Mutex<VecDeque<OrderAck>>,
}

impl PaperExecution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent orders fail (simulates a venue outage).
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Most recent acknowledged orders, oldest first.
    pub fn fills(&self) -> Vec<OrderAck> {
        let fills = self.fills.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        fills.iter().cloned().collect()
    }
}

#[async_trait]
impl OrderExecution for PaperExecution {
    async fn submit_order(
        &self,
        asset_id: &str,
        side: TradeSide,
        amount: Decimal,
    ) -> Result<OrderAck, ExecutionError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(ExecutionError::Rejected {
                asset_id: asset_id.to_string(),
                side,
                message: "paper venue is rejecting orders".to_string(),
            });
        }

        let ack = OrderAck::paper(asset_id, side, amount);
        info!(
            asset = %asset_id,
            side = %side,
            amount = %amount.round_dp(4),
            order_id = %ack.order_id,
            "[PAPER] Order acknowledged"
        );

        let mut fills = self.fills.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if fills.len() == FILL_LOG_CAPACITY {
            fills.pop_front();
        }
        fills.push_back(ack.clone());
        drop(fills);
        Ok(ack)
    }

    fn is_paper(&self) -> bool {
        true
    }
}
