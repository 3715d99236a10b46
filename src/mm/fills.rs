//! Toy fill simulation
//!
//! One independent uniform draw per posted quote: with configured
//! probabilities the market lifts our ask (we sell) or hits our bid (we
//! buy). No order book, no queue position, just arrival probabilities.

use rand::Rng;

use crate::core::FillConfig;
use crate::ledger::Side;

use super::quote::Quote;

/// Simulated taker interaction with one quote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedFill {
    pub side: Side,
    pub qty: u32,
    pub price: f64,
}

/// Draws fills against posted quotes
#[derive(Debug, Clone, Copy)]
pub struct FillSimulator {
    cfg: FillConfig,
}

impl FillSimulator {
    pub fn new(cfg: FillConfig) -> Self {
        Self { cfg }
    }

    /// At most one fill per quote per tick. A lift takes our ask (we end up
    /// short), a hit takes our bid (we end up long).
    pub fn simulate<R: Rng>(&self, rng: &mut R, quote: &Quote) -> Option<SimulatedFill> {
        let u: f64 = rng.gen();
        if u < self.cfg.prob_lift_ask {
            Some(SimulatedFill {
                side: Side::Sell,
                qty: self.cfg.fill_size,
                price: quote.ask,
            })
        } else if u < self.cfg.prob_lift_ask + self.cfg.prob_hit_bid {
            Some(SimulatedFill {
                side: Side::Buy,
                qty: self.cfg.fill_size,
                price: quote.bid,
            })
        } else {
            None
        }
    }
}
