//! Position ledger.
//!
//! In-memory map from asset id to the single open position for that
//! asset. Owned by exactly one agent and accessed from one task only;
//! it carries no locks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::types::{AgentError, AgentResult, Position};

#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<String, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_position(&self, asset_id: &str) -> bool {
        self.positions.contains_key(asset_id)
    }

    pub fn get(&self, asset_id: &str) -> Option<&Position> {
        self.positions.get(asset_id)
    }

    /// Open a position. Fails with `Conflict` if one is already open for
    /// `asset_id`; the existing entry is left untouched.
    pub fn open(
        &mut self,
        asset_id: &str,
        amount: Decimal,
        entry_price: Decimal,
        at: DateTime<Utc>,
    ) -> AgentResult<&Position> {
        if self.positions.contains_key(asset_id) {
            return Err(AgentError::Conflict(asset_id.to_string()));
        }
        let position = Position {
            asset_id: asset_id.to_string(),
            amount,
            entry_price,
            entry_time: at,
        };
        Ok(self
            .positions
            .entry(asset_id.to_string())
            .or_insert(position))
    }

    /// Remove and return the open position for `asset_id`.
    pub fn close(&mut self, asset_id: &str) -> AgentResult<Position> {
        self.positions
            .remove(asset_id)
            .ok_or_else(|| AgentError::NotFound(asset_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Open positions sorted by asset id (stable order for reporting).
    pub fn snapshot(&self) -> Vec<Position> {
        let mut out: Vec<Position> = self.positions.values().cloned().collect();
        out.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        out
    }
}
