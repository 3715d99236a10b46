//! Market-making logic
//!
//! Quote generation with inventory skew, toy fill simulation, delta/vega
//! hedging, and the per-tick orchestration engine.

pub mod engine;
pub mod fills;
pub mod hedge;
pub mod quote;

pub use engine::*;
pub use fills::*;
pub use hedge::*;
pub use quote::*;
