//! Inventory-aware quote generation
//!
//! Turns a lattice fair value into a two-sided quote in two steps: shift the
//! mid against current inventory (so quotes lean toward trades that shed
//! risk), then split a strictly positive edge around the adjusted mid.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{EdgeMode, ExerciseStyle, MakerResult, OptionType, QuoteConfig};
use crate::ledger::RiskSnapshot;
use crate::pricing::lattice;

/// One two-sided quote, regenerated every tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub expiry: NaiveDate,
    pub strike: f64,
    pub option_type: OptionType,
    /// Model fair value before inventory adjustment
    pub fair_value: f64,
    /// Fair value after the inventory shift
    pub fair_value_adjusted: f64,
    pub bid: f64,
    pub ask: f64,
    /// Implied vol the fair value was computed with
    pub iv: f64,
}

/// Dollar shift applied against the fair value, from current exposures.
///
/// Linear policy: positive exposure produces a positive bias, which lowers
/// the quoted mid and encourages the market to take risk off our book. The
/// coefficients and cap are configuration, not derived quantities.
pub fn inventory_bias(risk: &RiskSnapshot, expiry: NaiveDate, cfg: &QuoteConfig) -> f64 {
    let raw = cfg.delta_bias * risk.delta_total + cfg.vega_bias * risk.vega_for(expiry);
    raw.clamp(-cfg.bias_cap, cfg.bias_cap)
}

/// Split a strictly positive edge around the adjusted fair value.
/// Guarantees bid <= fair value adjusted <= ask.
pub fn apply_edge(fair_value_adjusted: f64, cfg: &QuoteConfig) -> (f64, f64) {
    let edge = match cfg.edge_mode {
        EdgeMode::Absolute => cfg.edge_value,
        EdgeMode::Relative => cfg.edge_value * fair_value_adjusted,
    }
    .max(cfg.min_edge);

    let bid = (fair_value_adjusted - edge).max(0.0);
    let ask = fair_value_adjusted + edge;
    (bid, ask)
}

/// Price, bias, and quote one contract in a single call.
#[allow(clippy::too_many_arguments)]
pub fn inventory_aware_quote(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    time: f64,
    steps: usize,
    option_type: OptionType,
    exercise: ExerciseStyle,
    expiry: NaiveDate,
    risk: &RiskSnapshot,
    cfg: &QuoteConfig,
) -> MakerResult<Quote> {
    let fair_value = lattice::price(
        spot, strike, rate, dividend, vol, time, steps, option_type, exercise,
    )?;

    let bias = inventory_bias(risk, expiry, cfg);
    let fair_value_adjusted = (fair_value - bias).max(cfg.min_price);
    let (bid, ask) = apply_edge(fair_value_adjusted, cfg);

    Ok(Quote {
        expiry,
        strike,
        option_type,
        fair_value,
        fair_value_adjusted,
        bid,
        ask,
        iv: vol,
    })
}
