//! Shared types for the trading agent.
//!
//! These types form the data model used across all modules.
//! They are kept free of I/O so that the ledger, policy, executor
//! and driver can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Asset snapshot
// ---------------------------------------------------------------------------

/// A point-in-time market read for one asset.
///
/// Produced fresh on every scan and discarded after one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    /// Asset identifier (token address on the launchpad).
    pub id: String,
    pub name: String,
    /// Current unit price in USD.
    pub price: Decimal,
    /// 24-hour traded volume in USD.
    #[serde(default)]
    pub volume_24h: Decimal,
    /// Available liquidity in USD.
    pub liquidity: Decimal,
    /// Signed 24-hour price change, in percent.
    pub price_change_24h: Decimal,
}

impl fmt::Display for AssetSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) @ ${} | {:+}% 24h | liq ${} | vol ${}",
            self.name,
            self.id,
            self.price,
            self.price_change_24h,
            self.liquidity,
            self.volume_24h,
        )
    }
}

impl AssetSnapshot {
    /// Reject snapshots that downstream arithmetic cannot handle.
    ///
    /// Price must be strictly positive; volume and liquidity non-negative.
    pub fn validate(&self) -> Result<(), String> {
        if self.price <= Decimal::ZERO {
            return Err(format!("non-positive price {}", self.price));
        }
        if self.volume_24h < Decimal::ZERO {
            return Err(format!("negative volume {}", self.volume_24h));
        }
        if self.liquidity < Decimal::ZERO {
            return Err(format!("negative liquidity {}", self.liquidity));
        }
        Ok(())
    }

    /// Helper to build a test snapshot with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: &str, price: Decimal, change_pct: Decimal) -> Self {
        AssetSnapshot {
            id: id.to_string(),
            name: format!("Token-{id}"),
            price,
            volume_24h: dec!(5000),
            liquidity: dec!(2000),
            price_change_24h: change_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// An open holding of one asset. Amount and entry price never change
/// after the position is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub asset_id: String,
    /// Token units held.
    pub amount: Decimal,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} amount={} entry=${} since {}",
            self.asset_id,
            self.amount.round_dp(4),
            self.entry_price,
            self.entry_time.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

impl Position {
    // Helpers return `None` when the result leaves `Decimal`'s range,
    // which happens for extreme micro-cap prices.

    /// Cost basis in USD.
    pub fn cost_basis(&self) -> Option<Decimal> {
        self.amount.checked_mul(self.entry_price)
    }

    /// P&L if the position were closed at `price`.
    pub fn unrealized_pnl(&self, price: Decimal) -> Option<Decimal> {
        price.checked_sub(self.entry_price)?.checked_mul(self.amount)
    }

    /// Percentage move from entry to `price`.
    pub fn pnl_pct(&self, price: Decimal) -> Option<Decimal> {
        price
            .checked_div(self.entry_price)?
            .checked_sub(Decimal::ONE)?
            .checked_mul(dec!(100))
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Output of the decision policy for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "🟢 BUY"),
            Decision::Sell => write!(f, "🔴 SELL"),
            Decision::Hold => write!(f, "⚪ HOLD"),
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// 24h change crossed the sell trigger.
    Signal,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::StopLoss => write!(f, "stop-loss"),
            ExitReason::TakeProfit => write!(f, "take-profit"),
        }
    }
}

// ---------------------------------------------------------------------------
// Execution types
// ---------------------------------------------------------------------------

/// Acknowledgement returned by the execution venue for a submitted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub asset_id: String,
    pub side: TradeSide,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl OrderAck {
    /// Create a paper acknowledgement (no real execution).
    pub fn paper(asset_id: &str, side: TradeSide, amount: Decimal) -> Self {
        Self {
            order_id: format!("paper-{}", uuid::Uuid::new_v4()),
            asset_id: asset_id.to_string(),
            side,
            amount,
            timestamp: Utc::now(),
        }
    }
}

/// A completed ledger change, as reported to the cycle report and dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub asset_id: String,
    pub asset_name: String,
    pub side: TradeSide,
    /// Token units bought or sold.
    pub amount: Decimal,
    pub price: Decimal,
    /// Realized P&L; zero for buys.
    pub realized_pnl: Decimal,
    /// Percentage move from entry; zero for buys.
    pub pnl_pct: Decimal,
    pub exit_reason: Option<ExitReason>,
    /// `None` when the ledger was mutated without an acknowledgement.
    pub order_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            TradeSide::Buy => write!(
                f,
                "BUY {} {} @ ${} (${})",
                self.amount.round_dp(4),
                self.asset_name,
                self.price,
                (self.amount * self.price).round_dp(2),
            ),
            TradeSide::Sell => write!(
                f,
                "SELL {} {} @ ${} | P&L ${} ({:+}%)",
                self.amount.round_dp(4),
                self.asset_name,
                self.price,
                self.realized_pnl.round_dp(2),
                self.pnl_pct.round_dp(2),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Performance summary for one agent instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub agent_id: String,
    pub wallet: String,
    pub trades_executed: u64,
    pub total_realized_pnl: Decimal,
    pub open_positions: usize,
    pub cycle_count: u64,
    pub started_at: DateTime<Utc>,
}

impl fmt::Display for AgentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | trades={} | realized P&L=${} | open={} | cycles={}",
            self.agent_id,
            self.trades_executed,
            self.total_realized_pnl.round_dp(2),
            self.open_positions,
            self.cycle_count,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Market-data query failures. Recoverable: the cycle is skipped.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("Market data request failed ({source_name}): {message}")]
    Request { source_name: String, message: String },

    #[error("Market data response could not be decoded: {0}")]
    Decode(String),

    #[error("Market data request timed out after {0:?}")]
    Timeout(Duration),
}

/// Order submission failures. Recoverable: logged, ledger left untouched
/// when acknowledgements are required.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Order {side} {asset_id} rejected: {message}")]
    Rejected {
        asset_id: String,
        side: TradeSide,
        message: String,
    },

    #[error("Order {side} {asset_id} timed out after {timeout:?}")]
    Timeout {
        asset_id: String,
        side: TradeSide,
        timeout: Duration,
    },
}

/// Domain-specific error taxonomy for the agent core.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Position already open for {0}")]
    Conflict(String),

    #[error("No open position for {0}")]
    NotFound(String),

    #[error("Invalid price ${price} for {asset_id}")]
    InvalidPrice { asset_id: String, price: Decimal },

    #[error("Arithmetic overflow computing {what} for {asset_id}")]
    Overflow { asset_id: String, what: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
