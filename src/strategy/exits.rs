//! Stop-loss / take-profit rules for held positions.

use rust_decimal::Decimal;

use crate::config::TradingConfig;
use crate::types::{ExitReason, Position};

#[derive(Debug, Clone)]
pub struct ExitRules {
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
}

impl ExitRules {
    pub fn new(stop_loss_pct: Decimal, take_profit_pct: Decimal) -> Self {
        Self {
            stop_loss_pct,
            take_profit_pct,
        }
    }

    pub fn from_config(cfg: &TradingConfig) -> Self {
        Self::new(cfg.stop_loss_pct, cfg.take_profit_pct)
    }

    /// Check a position against its fresh price. Thresholds are inclusive.
    /// A move too large to represent triggers nothing.
    pub fn exit_signal(&self, position: &Position, price: Decimal) -> Option<ExitReason> {
        let move_pct = position.pnl_pct(price)?;
        if move_pct <= self.stop_loss_pct {
            Some(ExitReason::StopLoss)
        } else if move_pct >= self.take_profit_pct {
            Some(ExitReason::TakeProfit)
        } else {
            None
        }
    }
}
