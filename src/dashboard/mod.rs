//! Dashboard: Axum web server for read-only monitoring.
//!
//! Serves the agent's stats, open positions, recent trades and cycle
//! log as JSON. CORS enabled for local development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use routes::AppState;

/// Bind the dashboard port and serve in a background task.
///
/// Binding happens before returning so a taken port fails startup.
pub async fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard port {port}"))?;

    info!(port, "Dashboard server starting on http://localhost:{port}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Dashboard server error");
        }
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/stats", get(routes::get_stats))
        .route("/api/positions", get(routes::get_positions))
        .route("/api/trades", get(routes::get_trades))
        .route("/api/cycles", get(routes::get_cycles))
        .route("/api/driver", get(routes::get_driver))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TradingConfig;
    use crate::engine::agent::{AgentIdentity, CycleError, TraderAgent};
    use crate::engine::executor::TradeExecutor;
    use crate::engine::scanner::OpportunityScanner;
    use crate::platforms::paper::{PaperExecution, StaticMarketFeed};
    use crate::strategy::{ExitRules, ThresholdPolicy};
    use crate::types::AgentError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use routes::DashboardState;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn demo_agent() -> TraderAgent {
        let trading = TradingConfig::default();
        TraderAgent::new(
            AgentIdentity::new("3", "0xwallet"),
            OpportunityScanner::new(
                Box::new(StaticMarketFeed::demo()),
                trading.min_liquidity_usd,
                Duration::from_secs(5),
            ),
            ThresholdPolicy::from_config(&trading),
            ExitRules::from_config(&trading),
            TradeExecutor::new(Box::new(PaperExecution::new()), &trading, true, Duration::from_secs(5)),
        )
    }

    fn test_state() -> AppState {
        Arc::new(DashboardState::new(demo_agent().stats()))
    }

    async fn get_json(app: Router, uri: &str) -> serde_json::Value {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let json = get_json(build_router(test_state()), "/api/stats").await;
        assert_eq!(json["agent_id"], "3");
        assert_eq!(json["wallet"], "0xwallet");
        assert_eq!(json["trades_executed"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_404() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_published_cycle_visible() {
        let mut agent = demo_agent();
        let state = Arc::new(DashboardState::new(agent.stats()));
        let (_tx, rx) = watch::channel(false);

        // Demo listing: AgentToken +15.5% with liquidity 2000 → one buy.
        let report = agent.run_cycle(&rx).await.unwrap();
        state.publish_cycle(&agent, &report).await;

        let stats = get_json(build_router(state.clone()), "/api/stats").await;
        assert_eq!(stats["trades_executed"], 1);
        assert_eq!(stats["open_positions"], 1);

        let positions = get_json(build_router(state.clone()), "/api/positions").await;
        assert_eq!(positions.as_array().unwrap().len(), 1);
        assert_eq!(positions[0]["asset_id"], "0x1234");

        let trades = get_json(build_router(state.clone()), "/api/trades").await;
        assert_eq!(trades[0]["side"], "Buy");

        let cycles = get_json(build_router(state), "/api/cycles").await;
        assert_eq!(cycles[0]["cycle_number"], 1);
        assert_eq!(cycles[0]["buys"], 1);
    }

    #[tokio::test]
    async fn test_published_failure_visible() {
        let mut agent = demo_agent();
        let state = Arc::new(DashboardState::new(agent.stats()));
        let (_tx, rx) = watch::channel(false);

        // A cycle that bought before failing still reports its trade.
        let partial = agent.run_cycle(&rx).await.unwrap();
        let failure = CycleError {
            source: AgentError::NotFound("0x9".into()),
            partial,
        };
        state.publish_failure(&agent, &failure, 3).await;

        let driver = get_json(build_router(state.clone()), "/api/driver").await;
        assert_eq!(driver["state"], "backoff");
        assert_eq!(driver["consecutive_failures"], 3);
        assert_eq!(driver["last_error"], "No open position for 0x9");

        let trades = get_json(build_router(state.clone()), "/api/trades").await;
        assert_eq!(trades.as_array().unwrap().len(), 1);

        let cycles = get_json(build_router(state), "/api/cycles").await;
        assert_eq!(cycles[0]["aborted"], true);
    }
}
