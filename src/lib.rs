//! # Lattice Maker - Options Market-Making Simulator
//!
//! An educational market-making simulator for listed options. It prices
//! American and European contracts on a CRR binomial lattice, backs implied
//! volatility out of market prices, quotes two-sided markets skewed by its
//! own inventory, simulates probabilistic fills, and hedges the resulting
//! delta and vega exposures automatically.
//!
//! ## Key Components
//!
//! - **Lattice pricer**: CRR backward induction, American early exercise
//! - **IV solver**: bracketed bisection with a warm-start cache and an
//!   explicit fallback status for non-converged solves
//! - **Greeks**: finite differences layered on the lattice
//! - **Risk book**: average-cost positions, realized/unrealized PnL, and
//!   on-demand risk snapshots with JSON persistence
//! - **Quoting**: inventory-aware mid adjustment plus a configurable edge
//! - **Hedging**: threshold delta hedges in shares, soft same-expiry vega
//!   hedges in ATM options
//! - **Feed**: seeded synthetic snapshots so runs work offline
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lattice_maker::prelude::*;
//! use chrono::NaiveDate;
//!
//! let cfg = MakerConfig::default();
//! let as_of = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
//! let mut feed = SimFeed::new(SimConfig::default(), 100.0, as_of, 42);
//! let mut solver = IvSolver::new(cfg.iv);
//! let book = RiskBook::new(cfg.contract_multiplier);
//! let mut engine = MakerEngine::new(cfg.clone(), book, 42, None);
//!
//! let market = feed.next_snapshot().unwrap();
//! let surface = build_surface(&mut solver, &market, &cfg);
//! let report = engine.run_tick(&market, &surface).unwrap();
//! println!("tick: {} quotes, {} fills", report.quotes, report.fills);
//! ```
//!
//! ## What This Simulator Does NOT Do
//!
//! - Model discrete dividends, transaction costs, slippage, or latency
//! - Replay a real order book; fills are arrival probabilities
//! - Claim optimal inventory skew or hedge sizing; both are heuristics
//!   exposed as configuration

pub mod core;
pub mod data;
pub mod ledger;
pub mod mm;
pub mod pricing;
pub mod surface;

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::core::{
        ChainSnapshot, EdgeMode, ExerciseStyle, InstrumentId, MakerConfig, MakerError,
        MakerResult, MarketSnapshot, OptionType, StrikeQuote,
    };

    pub use crate::pricing::{
        black_scholes,
        greeks::{self, PointGreeks},
        iv::{IvOutcome, IvSolver, IvStatus},
        lattice,
    };

    pub use crate::surface::{build_surface, VolQuote, VolSurface};

    pub use crate::ledger::{
        Fill, HedgeKind, HedgeTrade, Position, RiskBook, RiskSnapshot, Side,
    };

    pub use crate::mm::{
        delta_hedge, vega_hedge, FillSimulator, MakerEngine, Quote, TickPhase, TickReport,
    };

    pub use crate::data::{EventLog, SimConfig, SimFeed};
}

// Re-export main types at crate root
pub use crate::core::{MakerConfig, MakerError, MakerResult};
pub use crate::ledger::RiskBook;
pub use crate::mm::MakerEngine;
