//! Threshold momentum policy.
//!
//! Buy when the 24h change is above the buy trigger and nothing is held;
//! sell when it is below the sell trigger and a position is open; hold
//! otherwise. No averaging in, no shorting.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::TradingConfig;
use crate::engine::ledger::PositionLedger;
use crate::types::{AssetSnapshot, Decision};

#[derive(Debug, Clone)]
pub struct ThresholdPolicy {
    buy_trigger_pct: Decimal,
    sell_trigger_pct: Decimal,
}

impl ThresholdPolicy {
    pub fn new(buy_trigger_pct: Decimal, sell_trigger_pct: Decimal) -> Self {
        Self {
            buy_trigger_pct,
            sell_trigger_pct,
        }
    }

    pub fn from_config(cfg: &TradingConfig) -> Self {
        Self::new(cfg.buy_trigger_pct, cfg.sell_trigger_pct)
    }

    /// Classify one snapshot against the current ledger.
    ///
    /// The buy branch is checked first, so a misconfigured pair of
    /// triggers resolves to Buy; `AppConfig::validate` rejects that case
    /// before the agent starts.
    pub fn classify(&self, snapshot: &AssetSnapshot, ledger: &PositionLedger) -> Decision {
        let change = snapshot.price_change_24h;
        let held = ledger.has_position(&snapshot.id);

        let decision = if change > self.buy_trigger_pct && !held {
            Decision::Buy
        } else if change < self.sell_trigger_pct && held {
            Decision::Sell
        } else {
            Decision::Hold
        };

        debug!(
            asset = %snapshot.id,
            change = %change,
            held,
            decision = ?decision,
            "Classified"
        );
        decision
    }
}
