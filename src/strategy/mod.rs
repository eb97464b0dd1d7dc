//! Strategy: entry/exit classification and position exit rules.

pub mod exits;
pub mod policy;

pub use exits::ExitRules;
pub use policy::ThresholdPolicy;
