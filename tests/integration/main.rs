//! End-to-end tests: full agent cycles against an in-memory market.

mod agent_cycle;
mod mock_market;
