//! Core data types for the market-making simulator
//!
//! Defines fundamental types:
//! - OptionType / ExerciseStyle / InstrumentId: contract identity
//! - MarketSnapshot: read-only per-tick market input
//! - MakerConfig: the full configuration surface
//! - MakerError: the error taxonomy

pub mod config;
pub mod contract;
pub mod error;
pub mod market;

pub use config::*;
pub use contract::*;
pub use error::*;
pub use market::*;
