//! Trade executor.
//!
//! Applies Buy and Sell decisions: submits the order to the execution
//! venue, then opens or closes the ledger entry, computes realized P&L
//! and updates the performance counters. The executor owns the ledger
//! and counters; everything else only gets shared references.
//!
//! With `require_ack` set (the default) the ledger changes only after
//! the venue acknowledges the order. With it cleared, a failed order is
//! logged and the ledger is updated anyway.

use chrono::Utc;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, info, warn};

use super::accountant::PerformanceCounters;
use super::ledger::PositionLedger;
use crate::config::TradingConfig;
use crate::platforms::OrderExecution;
use crate::types::{
    AgentError, AgentResult, AssetSnapshot, ExecutionError, ExitReason, OrderAck, TradeRecord,
    TradeSide,
};

pub struct TradeExecutor {
    venue: Box<dyn OrderExecution>,
    ledger: PositionLedger,
    counters: PerformanceCounters,
    buy_amount_usd: Decimal,
    require_ack: bool,
    timeout: Duration,
}

impl TradeExecutor {
    pub fn new(
        venue: Box<dyn OrderExecution>,
        trading: &TradingConfig,
        require_ack: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            venue,
            ledger: PositionLedger::new(),
            counters: PerformanceCounters::new(),
            buy_amount_usd: trading.buy_amount_usd(),
            require_ack,
            timeout,
        }
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn counters(&self) -> &PerformanceCounters {
        &self.counters
    }

    pub fn is_paper(&self) -> bool {
        self.venue.is_paper()
    }

    /// Open a position sized at `min(max_position_size, initial_allocation)` USD.
    pub async fn execute_buy(&mut self, snapshot: &AssetSnapshot) -> AgentResult<TradeRecord> {
        if self.ledger.has_position(&snapshot.id) {
            error!(asset = %snapshot.id, "Buy requested for an asset that is already held");
            return Err(AgentError::Conflict(snapshot.id.clone()));
        }
        if snapshot.price <= Decimal::ZERO {
            return Err(AgentError::InvalidPrice {
                asset_id: snapshot.id.clone(),
                price: snapshot.price,
            });
        }

        let amount_usd = self.buy_amount_usd;
        let amount = amount_usd
            .checked_div(snapshot.price)
            .ok_or_else(|| overflow(&snapshot.id, "buy amount"))?;

        info!(
            asset = %snapshot.id,
            name = %snapshot.name,
            amount = %amount.round_dp(4),
            usd = %amount_usd,
            price = %snapshot.price,
            "💰 Buying"
        );

        let ack = self.submit(&snapshot.id, TradeSide::Buy, amount).await?;

        let now = Utc::now();
        self.ledger.open(&snapshot.id, amount, snapshot.price, now)?;
        self.counters.record_open();

        info!(asset = %snapshot.id, order_id = ?ack.as_ref().map(|a| &a.order_id), "✅ Buy executed");

        Ok(TradeRecord {
            asset_id: snapshot.id.clone(),
            asset_name: snapshot.name.clone(),
            side: TradeSide::Buy,
            amount,
            price: snapshot.price,
            realized_pnl: Decimal::ZERO,
            pnl_pct: Decimal::ZERO,
            exit_reason: None,
            order_id: ack.map(|a| a.order_id),
            timestamp: now,
        })
    }

    /// Close the open position for `snapshot.id` at `snapshot.price`.
    pub async fn execute_sell(
        &mut self,
        snapshot: &AssetSnapshot,
        reason: ExitReason,
    ) -> AgentResult<TradeRecord> {
        let position = match self.ledger.get(&snapshot.id) {
            Some(p) => p.clone(),
            None => {
                warn!(asset = %snapshot.id, reason = %reason, "Sell requested with no open position");
                return Err(AgentError::NotFound(snapshot.id.clone()));
            }
        };
        if snapshot.price <= Decimal::ZERO {
            return Err(AgentError::InvalidPrice {
                asset_id: snapshot.id.clone(),
                price: snapshot.price,
            });
        }

        let exit_price = snapshot.price;
        let realized_pnl = position
            .unrealized_pnl(exit_price)
            .ok_or_else(|| overflow(&snapshot.id, "realized P&L"))?;
        let pnl_pct = position
            .pnl_pct(exit_price)
            .ok_or_else(|| overflow(&snapshot.id, "P&L percentage"))?;

        info!(
            asset = %snapshot.id,
            name = %snapshot.name,
            amount = %position.amount.round_dp(4),
            reason = %reason,
            "💰 Selling"
        );

        let ack = self.submit(&snapshot.id, TradeSide::Sell, position.amount).await?;

        self.ledger.close(&snapshot.id)?;
        self.counters.record_close(realized_pnl);

        info!(
            asset = %snapshot.id,
            pnl = format!("${:.2}", realized_pnl),
            pnl_pct = format!("{:+.2}%", pnl_pct),
            "✅ Sell executed"
        );

        Ok(TradeRecord {
            asset_id: snapshot.id.clone(),
            asset_name: snapshot.name.clone(),
            side: TradeSide::Sell,
            amount: position.amount,
            price: exit_price,
            realized_pnl,
            pnl_pct,
            exit_reason: Some(reason),
            order_id: ack.map(|a| a.order_id),
            timestamp: Utc::now(),
        })
    }

    /// Submit to the venue under the request timeout.
    ///
    /// Returns `Ok(None)` when the order failed but acknowledgements are
    /// not required.
    async fn submit(
        &self,
        asset_id: &str,
        side: TradeSide,
        amount: Decimal,
    ) -> AgentResult<Option<OrderAck>> {
        let result = match tokio::time::timeout(
            self.timeout,
            self.venue.submit_order(asset_id, side, amount),
        )
        .await
        {
            Ok(r) => r,
            Err(_) => Err(ExecutionError::Timeout {
                asset_id: asset_id.to_string(),
                side,
                timeout: self.timeout,
            }),
        };

        match result {
            Ok(ack) => Ok(Some(ack)),
            Err(e) if !self.require_ack => {
                warn!(
                    asset = %asset_id,
                    side = %side,
                    error = %e,
                    "Order not acknowledged; updating ledger anyway"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn overflow(asset_id: &str, what: &'static str) -> AgentError {
    warn!(asset = %asset_id, what, "Arithmetic overflow, skipping trade");
    AgentError::Overflow {
        asset_id: asset_id.to_string(),
        what,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
