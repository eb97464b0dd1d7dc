//! Trading agent context.
//!
//! Owns every component of one agent instance (scanner, policy, exit
//! rules, executor with its ledger and counters) and runs a single
//! scan → classify → dispatch → manage-positions cycle. Retry and
//! scheduling live in [`CycleDriver`](super::driver::CycleDriver).

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::accountant::{Accountant, CycleReport, FailedTrade};
use super::executor::TradeExecutor;
use super::ledger::PositionLedger;
use super::scanner::OpportunityScanner;
use crate::strategy::{ExitRules, ThresholdPolicy};
use crate::types::{
    AgentError, AgentResult, AgentStats, AssetSnapshot, Decision, ExitReason, TradeRecord,
    TradeSide,
};

/// An aborted cycle. `partial` holds whatever the cycle did before the
/// failure, reconciled against the current counters.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct CycleError {
    #[source]
    pub source: AgentError,
    pub partial: CycleReport,
}

/// Who this agent trades as.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub agent_id: String,
    pub wallet: String,
}

impl AgentIdentity {
    pub fn new(agent_id: impl Into<String>, wallet: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            wallet: wallet.into(),
        }
    }

    /// Display name used in logs.
    pub fn display_name(&self) -> String {
        format!("TraderAgent-{}", self.agent_id)
    }
}

pub struct TraderAgent {
    identity: AgentIdentity,
    scanner: OpportunityScanner,
    policy: ThresholdPolicy,
    exits: ExitRules,
    executor: TradeExecutor,
    cycle_count: u64,
    started_at: DateTime<Utc>,
}

impl TraderAgent {
    pub fn new(
        identity: AgentIdentity,
        scanner: OpportunityScanner,
        policy: ThresholdPolicy,
        exits: ExitRules,
        executor: TradeExecutor,
    ) -> Self {
        info!(
            agent = %identity.display_name(),
            wallet = %identity.wallet,
            paper = executor.is_paper(),
            "📊 Agent initialized"
        );
        Self {
            identity,
            scanner,
            policy,
            exits,
            executor,
            cycle_count: 0,
            started_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn ledger(&self) -> &PositionLedger {
        self.executor.ledger()
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Current performance summary.
    pub fn stats(&self) -> AgentStats {
        let counters = self.executor.counters();
        AgentStats {
            agent_id: self.identity.agent_id.clone(),
            wallet: self.identity.wallet.clone(),
            trades_executed: counters.trades_executed(),
            total_realized_pnl: counters.total_realized_pnl(),
            open_positions: self.executor.ledger().len(),
            cycle_count: self.cycle_count,
            started_at: self.started_at,
        }
    }

    /// Run one full cycle.
    ///
    /// Market-data failures and ledger invariant violations abort the
    /// cycle with a [`CycleError`] that still carries the trades made
    /// before the failure. A rejected or timed-out order, or a price too
    /// extreme to size, is recorded in the report and the remaining
    /// candidates are still evaluated.
    /// If `shutdown` flips mid-cycle the partial report is returned.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> Result<CycleReport, CycleError> {
        self.cycle_count += 1;
        let mut report = CycleReport::new(self.cycle_count);
        info!(cycle = self.cycle_count, "Starting cycle");

        match self.cycle_steps(shutdown, &mut report).await {
            Ok(()) => Ok(self.finish(report)),
            Err(source) => Err(CycleError {
                source,
                partial: self.finish(report),
            }),
        }
    }

    async fn cycle_steps(
        &mut self,
        shutdown: &watch::Receiver<bool>,
        report: &mut CycleReport,
    ) -> AgentResult<()> {
        // 1. Scan
        let scan = self.scanner.scan_with_quotes().await?;
        report.assets_listed = scan.quotes.len();
        report.candidates = scan.candidates.len();

        if *shutdown.borrow() {
            info!(cycle = self.cycle_count, "Shutdown requested after scan");
            return Ok(());
        }

        // 2. Evaluate candidates
        if !scan.candidates.is_empty() {
            info!(count = scan.candidates.len(), "💡 Evaluating opportunities");
        }
        for snapshot in &scan.candidates {
            if *shutdown.borrow() {
                info!(cycle = self.cycle_count, "Shutdown requested, skipping remaining candidates");
                return Ok(());
            }
            self.evaluate(snapshot, report).await?;
        }

        // 3. Manage open positions
        self.manage_positions(&scan.quotes, report).await
    }

    async fn evaluate(&mut self, snapshot: &AssetSnapshot, report: &mut CycleReport) -> AgentResult<()> {
        let decision = self.policy.classify(snapshot, self.executor.ledger());
        info!(
            asset = %snapshot.id,
            name = %snapshot.name,
            change = format!("{:+}%", snapshot.price_change_24h),
            "{decision}"
        );

        let result = match decision {
            Decision::Buy => self.executor.execute_buy(snapshot).await,
            Decision::Sell => self.executor.execute_sell(snapshot, ExitReason::Signal).await,
            Decision::Hold => {
                report.holds += 1;
                return Ok(());
            }
        };

        let side = match decision {
            Decision::Sell => TradeSide::Sell,
            _ => TradeSide::Buy,
        };
        Self::absorb(result, &snapshot.id, side, report)
    }

    /// Re-check held positions against fresh quotes for stop-loss and
    /// take-profit exits.
    async fn manage_positions(
        &mut self,
        quotes: &HashMap<String, AssetSnapshot>,
        report: &mut CycleReport,
    ) -> AgentResult<()> {
        if self.executor.ledger().is_empty() {
            return Ok(());
        }
        info!(count = self.executor.ledger().len(), "📊 Managing positions");

        for position in self.executor.ledger().snapshot() {
            let Some(quote) = quotes.get(&position.asset_id) else {
                debug!(asset = %position.asset_id, "No fresh quote for held position");
                continue;
            };

            match (position.unrealized_pnl(quote.price), position.pnl_pct(quote.price)) {
                (Some(pnl), Some(pct)) => debug!(
                    asset = %position.asset_id,
                    unrealized = format!("${:.2}", pnl),
                    move_pct = format!("{:+.2}%", pct),
                    "Position check"
                ),
                _ => {
                    warn!(asset = %position.asset_id, price = %quote.price, "P&L out of range, skipping exit check");
                    continue;
                }
            }

            if let Some(reason) = self.exits.exit_signal(&position, quote.price) {
                info!(asset = %position.asset_id, reason = %reason, "Exit triggered");
                let result = self.executor.execute_sell(quote, reason).await;
                Self::absorb(result, &position.asset_id, TradeSide::Sell, report)?;
            }
        }
        Ok(())
    }

    /// Fold one trade result into the report. Execution failures and
    /// arithmetic overflow are recorded; anything else propagates.
    fn absorb(
        result: AgentResult<TradeRecord>,
        asset_id: &str,
        side: TradeSide,
        report: &mut CycleReport,
    ) -> AgentResult<()> {
        match result {
            Ok(trade) => {
                report.record_trade(trade);
                Ok(())
            }
            Err(e @ (AgentError::Execution(_) | AgentError::Overflow { .. })) => {
                warn!(asset = %asset_id, side = %side, error = %e, "Trade failed, continuing cycle");
                report.failed.push(FailedTrade {
                    asset_id: asset_id.to_string(),
                    side,
                    reason: e.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn finish(&self, mut report: CycleReport) -> CycleReport {
        Accountant::reconcile(&mut report, self.executor.counters(), self.executor.ledger().len());
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
