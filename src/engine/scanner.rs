//! Opportunity scanner.
//!
//! Pulls the full listing from the market-data source, drops malformed
//! snapshots and keeps the candidates whose liquidity clears the
//! configured floor. A failed query is surfaced as `DataSourceError`,
//! never as an empty candidate list.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::platforms::MarketData;
use crate::types::{AssetSnapshot, DataSourceError};

/// Result of one scan: filtered candidates plus every valid listed
/// snapshot keyed by asset id (fresh quotes for position housekeeping).
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub candidates: Vec<AssetSnapshot>,
    pub quotes: HashMap<String, AssetSnapshot>,
    /// Snapshots dropped by validation.
    pub rejected: usize,
}

pub struct OpportunityScanner {
    source: Box<dyn MarketData>,
    min_liquidity: Decimal,
    timeout: Duration,
}

impl OpportunityScanner {
    pub fn new(source: Box<dyn MarketData>, min_liquidity: Decimal, timeout: Duration) -> Self {
        Self {
            source,
            min_liquidity,
            timeout,
        }
    }

    /// Candidates with `liquidity >= min_liquidity`, in source order.
    pub async fn scan(&self) -> Result<Vec<AssetSnapshot>, DataSourceError> {
        Ok(self.scan_with_quotes().await?.candidates)
    }

    /// Like [`scan`](Self::scan) but also returns every valid snapshot.
    pub async fn scan_with_quotes(&self) -> Result<ScanOutcome, DataSourceError> {
        let listed = tokio::time::timeout(self.timeout, self.source.list_assets())
            .await
            .map_err(|_| DataSourceError::Timeout(self.timeout))??;

        let outcome = self.filter(listed);

        if outcome.candidates.is_empty() {
            info!(listed = outcome.quotes.len(), "Scan complete: no candidates above liquidity floor");
        } else {
            info!(
                listed = outcome.quotes.len(),
                candidates = outcome.candidates.len(),
                rejected = outcome.rejected,
                "Scan complete"
            );
        }
        Ok(outcome)
    }

    fn filter(&self, listed: Vec<AssetSnapshot>) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for snap in listed {
            if let Err(reason) = snap.validate() {
                warn!(asset = %snap.id, %reason, "Dropping malformed snapshot");
                outcome.rejected += 1;
                continue;
            }
            if snap.liquidity >= self.min_liquidity {
                outcome.candidates.push(snap.clone());
            } else {
                debug!(
                    asset = %snap.id,
                    liquidity = %snap.liquidity,
                    floor = %self.min_liquidity,
                    "Below liquidity floor"
                );
            }
            outcome.quotes.insert(snap.id.clone(), snap);
        }

        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
