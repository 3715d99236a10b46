//! Pricing stack
//!
//! Implements:
//! - CRR binomial lattice (production path, American + European)
//! - Black-Scholes closed form (European cross-check only)
//! - Finite-difference Greeks layered on the lattice
//! - Bracketed-bisection implied vol with a warm-start cache

pub mod black_scholes;
pub mod greeks;
pub mod iv;
pub mod lattice;

pub use greeks::*;
pub use iv::*;
pub use lattice::{lower_bound, price, upper_bound, vol_floor};
