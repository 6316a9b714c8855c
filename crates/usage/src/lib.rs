//! Per-IP usage accounting
//!
//! Keeps a daily token tally per client IP and blocks clients that cross
//! the configured limit until the next UTC midnight.

pub mod ledger;

pub use ledger::{AllowAllGate, InMemoryUsageLedger};
