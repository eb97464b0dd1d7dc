//! Cycle driver: the agent's scheduling and retry envelope.
//!
//! Runs cycles back to back, sleeping `cycle_interval` after a good one
//! and `error_backoff` after a failed one. Backoff is a single fixed
//! interval with no retry cap; consecutive failures are counted and
//! logged. Every wait races the shutdown signal, so a stop request is
//! honoured without waiting out the sleep.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use super::agent::TraderAgent;
use crate::dashboard::routes::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverState {
    Running,
    Backoff,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Running => write!(f, "running"),
            DriverState::Backoff => write!(f, "backoff"),
        }
    }
}

pub struct CycleDriver {
    agent: TraderAgent,
    cycle_interval: Duration,
    error_backoff: Duration,
    dashboard: Option<AppState>,
    state: DriverState,
    consecutive_failures: u32,
}

impl CycleDriver {
    pub fn new(agent: TraderAgent, cycle_interval: Duration, error_backoff: Duration) -> Self {
        Self {
            agent,
            cycle_interval,
            error_backoff,
            dashboard: None,
            state: DriverState::Running,
            consecutive_failures: 0,
        }
    }

    /// Publish stats and cycle reports to the dashboard after every cycle.
    pub fn with_dashboard(mut self, dashboard: AppState) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn agent(&self) -> &TraderAgent {
        &self.agent
    }

    /// Run until `shutdown` becomes `true` (or its sender is dropped).
    /// Returns the agent so the caller can report final stats.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> TraderAgent {
        info!(
            agent = %self.agent.identity().display_name(),
            interval_secs = self.cycle_interval.as_secs(),
            backoff_secs = self.error_backoff.as_secs(),
            "🚀 Entering main loop"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = match self.agent.run_cycle(&shutdown).await {
                Ok(report) => {
                    if self.state == DriverState::Backoff {
                        info!(after_failures = self.consecutive_failures, "Recovered, resuming normal cadence");
                    }
                    self.state = DriverState::Running;
                    self.consecutive_failures = 0;
                    if let Some(dash) = &self.dashboard {
                        dash.publish_cycle(&self.agent, &report).await;
                    }
                    self.cycle_interval
                }
                Err(e) => {
                    self.state = DriverState::Backoff;
                    self.consecutive_failures += 1;
                    error!(
                        cycle = self.agent.cycle_count(),
                        error = %e,
                        trades_before_failure = e.partial.trades.len(),
                        consecutive_failures = self.consecutive_failures,
                        backoff_secs = self.error_backoff.as_secs(),
                        "❌ Cycle failed, backing off"
                    );
                    if let Some(dash) = &self.dashboard {
                        dash.publish_failure(&self.agent, &e, self.consecutive_failures)
                            .await;
                    }
                    self.error_backoff
                }
            };

            if !sleep_or_shutdown(wait, &mut shutdown).await {
                break;
            }
        }

        info!(stats = %self.agent.stats(), "Cycle driver stopped");
        self.agent
    }
}

/// Sleep for `wait` unless shutdown arrives first. Returns `false` on shutdown.
async fn sleep_or_shutdown(wait: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(wait) => true,
        _ = shutdown.wait_for(|stop| *stop) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
