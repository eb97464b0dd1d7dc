//! External collaborators.
//!
//! Defines the `MarketData` and `OrderExecution` traits consumed by the
//! agent core and provides implementations for:
//! - `StaticMarketFeed` / `PaperExecution`: in-process paper trading
//! - `HttpMarketFeed`: JSON token list over HTTP

pub mod http_feed;
pub mod paper;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{AssetSnapshot, DataSourceError, ExecutionError, OrderAck, TradeSide};

/// Source of market snapshots for all currently listed assets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch a snapshot of every listed asset. Ordering is source-defined.
    async fn list_assets(&self) -> Result<Vec<AssetSnapshot>, DataSourceError>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}

/// Venue that accepts buy/sell orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderExecution: Send + Sync {
    /// Submit an order for `amount` token units. Returns the venue's
    /// acknowledgement, or an error if the order was not accepted.
    async fn submit_order(
        &self,
        asset_id: &str,
        side: TradeSide,
        amount: Decimal,
    ) -> Result<OrderAck, ExecutionError>;

    /// Whether orders are simulated rather than sent to a real venue.
    fn is_paper(&self) -> bool;
}
