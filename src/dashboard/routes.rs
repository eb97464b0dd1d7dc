//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`
//! and written only by the cycle driver, once per cycle.

use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::accountant::CycleReport;
use crate::engine::agent::{CycleError, TraderAgent};
use crate::engine::driver::DriverState;
use crate::types::{AgentStats, Position, TradeRecord};

/// Entries kept in each rolling log.
const LOG_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub stats: RwLock<AgentStats>,
    pub positions: RwLock<Vec<Position>>,
    pub recent_trades: RwLock<VecDeque<TradeRecord>>,
    pub cycle_log: RwLock<VecDeque<CycleLogEntry>>,
    pub driver: RwLock<DriverStatus>,
}

impl DashboardState {
    pub fn new(initial: AgentStats) -> Self {
        Self {
            stats: RwLock::new(initial),
            positions: RwLock::new(Vec::new()),
            recent_trades: RwLock::new(VecDeque::new()),
            cycle_log: RwLock::new(VecDeque::new()),
            driver: RwLock::new(DriverStatus::default()),
        }
    }

    /// Record a completed cycle.
    pub async fn publish_cycle(&self, agent: &TraderAgent, report: &CycleReport) {
        self.record_report(agent, report, false).await;

        let mut driver = self.driver.write().await;
        driver.state = DriverState::Running;
        driver.consecutive_failures = 0;
    }

    /// Record a failed cycle, including any trades it made before failing.
    pub async fn publish_failure(&self, agent: &TraderAgent, error: &CycleError, consecutive: u32) {
        self.record_report(agent, &error.partial, true).await;

        let mut driver = self.driver.write().await;
        driver.state = DriverState::Backoff;
        driver.consecutive_failures = consecutive;
        driver.last_error = Some(error.to_string());
        driver.last_error_at = Some(chrono::Utc::now().to_rfc3339());
    }

    async fn record_report(&self, agent: &TraderAgent, report: &CycleReport, aborted: bool) {
        *self.stats.write().await = agent.stats();
        *self.positions.write().await = agent.ledger().snapshot();

        {
            let mut trades = self.recent_trades.write().await;
            for t in &report.trades {
                push_bounded(&mut *trades, t.clone());
            }
        }

        let mut entry = CycleLogEntry::from_report(report);
        entry.aborted = aborted;
        push_bounded(&mut *self.cycle_log.write().await, entry);
    }
}

fn push_bounded<T>(log: &mut VecDeque<T>, item: T) {
    if log.len() == LOG_CAPACITY {
        log.pop_front();
    }
    log.push_back(item);
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub agent_id: String,
    pub wallet: String,
    pub trades_executed: u64,
    pub total_realized_pnl: Decimal,
    pub open_positions: usize,
    pub cycle_count: u64,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleLogEntry {
    pub cycle_number: u64,
    pub timestamp: String,
    pub assets_listed: usize,
    pub candidates: usize,
    pub buys: usize,
    pub sells: usize,
    pub failed: usize,
    pub cycle_pnl: Decimal,
    pub total_realized_pnl: Decimal,
    pub open_positions: usize,
    pub aborted: bool,
}

impl CycleLogEntry {
    pub fn from_report(report: &CycleReport) -> Self {
        Self {
            cycle_number: report.cycle_number,
            timestamp: report.timestamp.to_rfc3339(),
            assets_listed: report.assets_listed,
            candidates: report.candidates,
            buys: report.buys(),
            sells: report.sells(),
            failed: report.failed.len(),
            cycle_pnl: report.cycle_pnl,
            total_realized_pnl: report.total_realized_pnl,
            open_positions: report.open_positions,
            aborted: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverStatus {
    pub state: DriverState,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_error_at: Option<String>,
}

impl Default for DriverStatus {
    fn default() -> Self {
        Self {
            state: DriverState::Running,
            consecutive_failures: 0,
            last_error: None,
            last_error_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub type AppState = Arc<DashboardState>;

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.stats.read().await;
    let uptime = (chrono::Utc::now() - stats.started_at).num_seconds();

    Json(StatsResponse {
        agent_id: stats.agent_id.clone(),
        wallet: stats.wallet.clone(),
        trades_executed: stats.trades_executed,
        total_realized_pnl: stats.total_realized_pnl,
        open_positions: stats.open_positions,
        cycle_count: stats.cycle_count,
        uptime_secs: uptime,
    })
}

/// GET /api/positions
pub async fn get_positions(State(state): State<AppState>) -> Json<Vec<Position>> {
    Json(state.positions.read().await.clone())
}

/// GET /api/trades
pub async fn get_trades(State(state): State<AppState>) -> Json<Vec<TradeRecord>> {
    Json(state.recent_trades.read().await.iter().cloned().collect())
}

/// GET /api/cycles
pub async fn get_cycles(State(state): State<AppState>) -> Json<Vec<CycleLogEntry>> {
    Json(state.cycle_log.read().await.iter().cloned().collect())
}

/// GET /api/driver
pub async fn get_driver(State(state): State<AppState>) -> Json<DriverStatus> {
    Json(state.driver.read().await.clone())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
