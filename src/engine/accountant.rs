//! Accountant: performance counters and cycle reports.
//!
//! Counters are mutated only through the trade executor; the cycle
//! driver reads them to build reports and stats.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::types::{TradeRecord, TradeSide};

// ---------------------------------------------------------------------------
// Performance counters
// ---------------------------------------------------------------------------

/// Process-lifetime trading counters. Open position count is derived
/// from the ledger and not stored here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceCounters {
    trades_executed: u64,
    total_realized_pnl: Decimal,
    wins: u64,
    losses: u64,
}

impl PerformanceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trades_executed(&self) -> u64 {
        self.trades_executed
    }

    pub fn total_realized_pnl(&self) -> Decimal {
        self.total_realized_pnl
    }

    pub fn wins(&self) -> u64 {
        self.wins
    }

    pub fn losses(&self) -> u64 {
        self.losses
    }

    /// Win rate over closed trades, as a percentage.
    pub fn win_rate(&self) -> Decimal {
        let closed = self.wins + self.losses;
        if closed == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(self.wins) * Decimal::ONE_HUNDRED / Decimal::from(closed)
        }
    }

    pub(crate) fn record_open(&mut self) {
        self.trades_executed += 1;
    }

    pub(crate) fn record_close(&mut self, realized_pnl: Decimal) {
        self.trades_executed += 1;
        self.total_realized_pnl = self.total_realized_pnl.saturating_add(realized_pnl);
        if realized_pnl > Decimal::ZERO {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// An order that failed during a cycle without aborting it.
#[derive(Debug, Clone, Serialize)]
pub struct FailedTrade {
    pub asset_id: String,
    pub side: TradeSide,
    pub reason: String,
}

/// Summary of a complete scan→evaluate→manage cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub assets_listed: usize,
    pub candidates: usize,
    pub holds: usize,
    pub trades: Vec<TradeRecord>,
    pub failed: Vec<FailedTrade>,
    pub cycle_pnl: Decimal,
    pub open_positions: usize,
    pub trades_executed: u64,
    pub total_realized_pnl: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl CycleReport {
    pub fn new(cycle_number: u64) -> Self {
        Self {
            cycle_number,
            assets_listed: 0,
            candidates: 0,
            holds: 0,
            trades: Vec::new(),
            failed: Vec::new(),
            cycle_pnl: Decimal::ZERO,
            open_positions: 0,
            trades_executed: 0,
            total_realized_pnl: Decimal::ZERO,
            timestamp: Utc::now(),
        }
    }

    pub fn buys(&self) -> usize {
        self.trades.iter().filter(|t| t.side == TradeSide::Buy).count()
    }

    pub fn sells(&self) -> usize {
        self.trades.iter().filter(|t| t.side == TradeSide::Sell).count()
    }

    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.cycle_pnl = self.cycle_pnl.saturating_add(trade.realized_pnl);
        self.trades.push(trade);
    }
}

// ---------------------------------------------------------------------------
// Accountant
// ---------------------------------------------------------------------------

pub struct Accountant;

impl Accountant {
    /// Stamp the end-of-cycle totals onto the report and log it.
    pub fn reconcile(report: &mut CycleReport, counters: &PerformanceCounters, open_positions: usize) {
        report.open_positions = open_positions;
        report.trades_executed = counters.trades_executed();
        report.total_realized_pnl = counters.total_realized_pnl();
        report.timestamp = Utc::now();

        info!(
            cycle = report.cycle_number,
            listed = report.assets_listed,
            candidates = report.candidates,
            buys = report.buys(),
            sells = report.sells(),
            holds = report.holds,
            failed = report.failed.len(),
            cycle_pnl = format!("${:.2}", report.cycle_pnl),
            total_pnl = format!("${:.2}", report.total_realized_pnl),
            open = open_positions,
            "Cycle complete"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
