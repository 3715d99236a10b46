//! Synthetic market feed
//!
//! Generates per-tick market snapshots offline: the spot follows a driftless
//! geometric Brownian step per tick, and chains are built from a static
//! smile (ATM vol plus skew and curvature in log-moneyness) with a symmetric
//! half-spread around the lattice theoretical value. Deterministic under a
//! seed, which keeps loop runs reproducible.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::{
    ChainSnapshot, ExerciseStyle, MakerResult, MarketSnapshot, OptionType, StrikeQuote,
};
use crate::pricing::lattice;

/// Feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Annualized vol of the spot random walk
    /// Default: 0.15
    pub walk_vol: f64,

    /// Years per tick; default is one trading minute
    /// (252 trading days x 390 minutes)
    pub dt_years: f64,

    /// Strike grid spacing
    /// Default: 5.0
    pub strike_spacing: f64,

    /// Strikes on each side of ATM
    /// Default: 6
    pub strikes_per_side: usize,

    /// Days to expiry for each generated chain
    /// Default: [30, 60]
    pub expiry_days: Vec<i64>,

    /// Option type quoted in the chains
    /// Default: Call
    pub option_type: OptionType,

    /// Half-spread around theoretical value
    /// Default: 0.05
    pub half_spread: f64,

    /// Smile: vol at the money
    /// Default: 0.20
    pub atm_vol: f64,

    /// Smile: linear skew per unit log-moneyness (negative tilts puts rich)
    /// Default: -0.10
    pub skew: f64,

    /// Smile: curvature per squared log-moneyness
    /// Default: 0.35
    pub curvature: f64,

    /// Lattice steps used to generate quote mids
    /// Default: 200
    pub steps: usize,

    /// Rate / dividend used to generate quote mids
    pub rate: f64,
    pub dividend: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            walk_vol: 0.15,
            dt_years: 1.0 / (252.0 * 390.0),
            strike_spacing: 5.0,
            strikes_per_side: 6,
            expiry_days: vec![30, 60],
            option_type: OptionType::Call,
            half_spread: 0.05,
            atm_vol: 0.20,
            skew: -0.10,
            curvature: 0.35,
            steps: 200,
            rate: 0.04,
            dividend: 0.0,
        }
    }
}

/// Synthetic snapshot generator
#[derive(Debug)]
pub struct SimFeed {
    cfg: SimConfig,
    spot: f64,
    as_of: NaiveDate,
    expiries: Vec<NaiveDate>,
    rng: StdRng,
}

impl SimFeed {
    pub fn new(cfg: SimConfig, spot: f64, as_of: NaiveDate, seed: u64) -> Self {
        let expiries = cfg
            .expiry_days
            .iter()
            .map(|&d| as_of + Duration::days(d))
            .collect();
        Self {
            cfg,
            spot,
            as_of,
            expiries,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Smile vol at the given strike for the current spot
    fn smile_vol(&self, strike: f64) -> f64 {
        let m = (strike / self.spot).ln();
        (self.cfg.atm_vol + self.cfg.skew * m + self.cfg.curvature * m * m).max(0.02)
    }

    /// Advance the spot one step and produce the next snapshot.
    pub fn next_snapshot(&mut self) -> MakerResult<MarketSnapshot> {
        let z: f64 = self.rng.sample(rand_distr::StandardNormal);
        self.spot *= (self.cfg.walk_vol * self.cfg.dt_years.sqrt() * z).exp();

        let atm = (self.spot / self.cfg.strike_spacing).round() * self.cfg.strike_spacing;
        let lo = -(self.cfg.strikes_per_side as i64);
        let hi = self.cfg.strikes_per_side as i64;

        let mut chains = Vec::with_capacity(self.expiries.len());
        for &expiry in &self.expiries {
            let time = crate::core::yearfrac(self.as_of, expiry);
            let mut quotes = Vec::new();
            for i in lo..=hi {
                let strike = atm + i as f64 * self.cfg.strike_spacing;
                if strike <= 0.0 {
                    continue;
                }
                let vol = self.smile_vol(strike);
                let theo = lattice::price(
                    self.spot,
                    strike,
                    self.cfg.rate,
                    self.cfg.dividend,
                    vol,
                    time,
                    self.cfg.steps,
                    self.cfg.option_type,
                    ExerciseStyle::American,
                )?;
                quotes.push(StrikeQuote {
                    strike,
                    option_type: self.cfg.option_type,
                    bid: (theo - self.cfg.half_spread).max(0.01),
                    ask: theo + self.cfg.half_spread,
                });
            }
            chains.push(ChainSnapshot::new(expiry, quotes));
        }

        Ok(MarketSnapshot::new(self.spot, self.as_of, chains))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> SimFeed {
        SimFeed::new(
            SimConfig::default(),
            100.0,
            NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            42,
        )
    }

    #[test]
    fn test_snapshot_shape() {
        let mut feed = feed();
        let snap = feed.next_snapshot().unwrap();
        assert_eq!(snap.chains.len(), 2);
        for chain in &snap.chains {
            assert_eq!(chain.quotes.len(), 13);
            for q in &chain.quotes {
                assert!(q.bid > 0.0);
                assert!(q.ask > q.bid);
            }
        }
    }

    #[test]
    fn test_spot_walk_moves_but_stays_close_per_minute() {
        let mut feed = feed();
        let s0 = feed.spot();
        for _ in 0..10 {
            feed.next_snapshot().unwrap();
        }
        let s1 = feed.spot();
        assert_ne!(s0, s1);
        // Ten one-minute steps at 15% annual vol move well under 1%
        assert!((s1 / s0 - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_deterministic_under_seed() {
        let mut a = feed();
        let mut b = feed();
        let sa = a.next_snapshot().unwrap();
        let sb = b.next_snapshot().unwrap();
        assert_eq!(sa.spot, sb.spot);
    }

    #[test]
    fn test_smile_is_convex_in_wings() {
        let feed = feed();
        let atm = feed.smile_vol(100.0);
        let wing = feed.smile_vol(70.0);
        assert!(wing > atm, "downside wing {wing} should exceed atm {atm}");
    }
}
