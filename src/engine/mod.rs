//! Core engine: the scan → classify → trade → account loop.

pub mod accountant;
pub mod agent;
pub mod driver;
pub mod executor;
pub mod ledger;
pub mod scanner;
