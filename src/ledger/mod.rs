//! Risk and inventory ledger
//!
//! Positions at average cost, append-only fill/hedge logs, realized PnL,
//! on-demand risk snapshots, and JSON persistence for session resume.

pub mod book;
pub mod events;
pub mod position;

pub use book::*;
pub use events::*;
pub use position::*;
