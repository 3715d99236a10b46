//! Data in and out
//!
//! Handles:
//! - Synthetic market snapshots (offline, seeded feed)
//! - Append-only JSONL event sinks for quotes, fills, and hedges

pub mod log;
pub mod sim;

pub use log::*;
pub use sim::*;
