//! Mock market feed for integration testing.
//!
//! Provides a deterministic `MarketData` implementation whose listing
//! can be swapped between cycles, all in-memory with no network.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

use trader_agent::platforms::MarketData;
use trader_agent::types::{AssetSnapshot, DataSourceError};

/// A controllable market feed. Clones share the same listing, so a test
/// can keep one handle and box another into the agent.
#[derive(Clone, Default)]
pub struct MockMarket {
    listing: Arc<Mutex<Vec<AssetSnapshot>>>,
    /// If set, `list_assets` returns this error message.
    force_error: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockMarket {
    pub fn with_listing(listing: Vec<AssetSnapshot>) -> Self {
        let market = Self::default();
        market.set_listing(listing);
        market
    }

    pub fn set_listing(&self, listing: Vec<AssetSnapshot>) {
        *self.listing.lock().unwrap() = listing;
    }

    /// Force all subsequent queries to fail.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl MarketData for MockMarket {
    async fn list_assets(&self) -> Result<Vec<AssetSnapshot>, DataSourceError> {
        *self.calls.lock().unwrap() += 1;
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(DataSourceError::Request {
                source_name: "mock".to_string(),
                message: msg,
            });
        }
        Ok(self.listing.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn token(id: &str, price: Decimal, change: Decimal, liquidity: Decimal) -> AssetSnapshot {
    AssetSnapshot {
        id: id.to_string(),
        name: format!("Token-{id}"),
        price,
        volume_24h: dec!(5000),
        liquidity,
        price_change_24h: change,
    }
}
