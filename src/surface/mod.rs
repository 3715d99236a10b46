//! Implied-volatility surface
//!
//! Batch IV construction across a market snapshot's chains: filter quotes by
//! moneyness and liquidity, solve each mid in parallel, keep the solves that
//! produced a usable vol. Per-contract solves are pure and fan out on a
//! rayon pool (the only parallel boundary in the system); the solver cache
//! is updated sequentially afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{MakerConfig, MarketSnapshot, OptionType};
use crate::pricing::iv::{solve_bracketed, IvRequest, IvSolver, IvStatus};

/// One solved point on the surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolQuote {
    pub expiry: NaiveDate,
    pub strike: f64,
    /// Option type whose market mid was inverted
    pub option_type: OptionType,
    pub sigma: f64,
    /// Converged or Fallback; rejected solves never reach the surface
    pub status: IvStatus,
    pub solved_at: DateTime<Utc>,
}

/// Implied-vol surface for one snapshot: per-expiry rows sorted by strike
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolSurface {
    /// Spot the surface was built against
    pub spot: f64,
    /// Valuation date the surface was built against
    pub as_of: NaiveDate,
    chains: BTreeMap<NaiveDate, Vec<VolQuote>>,
}

impl VolSurface {
    pub fn new(spot: f64, as_of: NaiveDate) -> Self {
        Self {
            spot,
            as_of,
            chains: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, quote: VolQuote) {
        let row = self.chains.entry(quote.expiry).or_default();
        match row.binary_search_by(|q| q.strike.total_cmp(&quote.strike)) {
            Ok(i) => row[i] = quote,
            Err(i) => row.insert(i, quote),
        }
    }

    pub fn expiries(&self) -> Vec<NaiveDate> {
        self.chains.keys().copied().collect()
    }

    /// Solved points for one expiry, sorted by strike
    pub fn quotes(&self, expiry: NaiveDate) -> &[VolQuote] {
        self.chains.get(&expiry).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Exact lookup by (expiry, strike)
    pub fn iv_at(&self, expiry: NaiveDate, strike: f64) -> Option<&VolQuote> {
        self.chains.get(&expiry).and_then(|row| {
            row.binary_search_by(|q| q.strike.total_cmp(&strike))
                .ok()
                .map(|i| &row[i])
        })
    }

    /// The point whose strike is nearest the given spot, for the expiry
    pub fn atm(&self, expiry: NaiveDate, spot: f64) -> Option<&VolQuote> {
        self.chains.get(&expiry).and_then(|row| {
            row.iter()
                .min_by(|a, b| (a.strike - spot).abs().total_cmp(&(b.strike - spot).abs()))
        })
    }

    pub fn len(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build a surface from a market snapshot.
///
/// Quotes outside the moneyness band or without a two-sided market are
/// filtered before solving. Solves run in parallel with read-only warm
/// hints; converged and fallback results update the cache sequentially and
/// land on the surface, rejected prices are dropped.
pub fn build_surface(
    solver: &mut IvSolver,
    market: &MarketSnapshot,
    cfg: &MakerConfig,
) -> VolSurface {
    let mut tasks: Vec<(IvRequest, Option<f64>)> = Vec::new();
    for chain in &market.chains {
        let time = market.time_to_expiry(chain.expiry);
        for quote in chain.liquid_quotes(
            market.spot,
            cfg.surface.moneyness_min,
            cfg.surface.moneyness_max,
        ) {
            let mid = match quote.mid() {
                Some(m) => m,
                None => continue,
            };
            let req = IvRequest {
                expiry: chain.expiry,
                observed: mid,
                spot: market.spot,
                strike: quote.strike,
                rate: cfg.rate,
                dividend: cfg.dividend,
                time,
                steps: cfg.steps,
                option_type: quote.option_type,
                exercise: cfg.exercise,
            };
            tasks.push((req, solver.hint(chain.expiry, quote.strike)));
        }
    }

    let iv_cfg = *solver.config();
    let solved: Vec<_> = tasks
        .par_iter()
        .map(|(req, hint)| (req, solve_bracketed(req, *hint, &iv_cfg)))
        .collect();

    let mut surface = VolSurface::new(market.spot, market.as_of);
    let (mut kept, mut dropped) = (0usize, 0usize);
    for (req, outcome) in solved {
        match outcome {
            Ok(outcome) => match outcome.sigma() {
                Some(sigma) => {
                    solver.remember(req.expiry, req.strike, sigma);
                    surface.insert(VolQuote {
                        expiry: req.expiry,
                        strike: req.strike,
                        option_type: req.option_type,
                        sigma,
                        status: outcome.status(),
                        solved_at: Utc::now(),
                    });
                    kept += 1;
                }
                None => dropped += 1,
            },
            Err(e) => {
                debug!(strike = req.strike, %e, "iv solve failed");
                dropped += 1;
            }
        }
    }
    debug!(kept, dropped, spot = market.spot, "surface built");
    surface
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChainSnapshot, ExerciseStyle, OptionType, StrikeQuote};
    use crate::pricing::lattice;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Chain whose mids are exact lattice prices at the given vol
    fn synthetic_market(spot: f64, true_vol: f64, cfg: &MakerConfig) -> MarketSnapshot {
        let as_of = date(2026, 8, 3);
        let expiry = date(2026, 11, 20);
        let time = crate::core::yearfrac(as_of, expiry);

        let quotes = [90.0, 95.0, 100.0, 105.0, 110.0]
            .iter()
            .map(|&strike| {
                let theo = lattice::price(
                    spot,
                    strike,
                    cfg.rate,
                    cfg.dividend,
                    true_vol,
                    time,
                    cfg.steps,
                    OptionType::Call,
                    ExerciseStyle::American,
                )
                .unwrap();
                StrikeQuote {
                    strike,
                    option_type: OptionType::Call,
                    bid: (theo - 0.01).max(0.01),
                    ask: theo + 0.01,
                }
            })
            .collect();

        MarketSnapshot::new(spot, as_of, vec![ChainSnapshot::new(expiry, quotes)])
    }

    #[test]
    fn test_surface_recovers_flat_vol() {
        let cfg = MakerConfig::default();
        let market = synthetic_market(100.0, 0.25, &cfg);
        let mut solver = IvSolver::new(cfg.iv);

        let surface = build_surface(&mut solver, &market, &cfg);
        assert_eq!(surface.len(), 5);
        for expiry in surface.expiries() {
            for q in surface.quotes(expiry) {
                assert_eq!(q.status, IvStatus::Converged);
                assert!(
                    (q.sigma - 0.25).abs() < 5e-3,
                    "strike {} recovered {}",
                    q.strike,
                    q.sigma
                );
            }
        }
        // Cache warmed for subsequent builds
        assert_eq!(solver.cache_len(), 5);
    }

    #[test]
    fn test_moneyness_filter_drops_wings() {
        let mut cfg = MakerConfig::default();
        cfg.surface.moneyness_min = 0.97;
        cfg.surface.moneyness_max = 1.03;
        let market = synthetic_market(100.0, 0.25, &cfg);
        let mut solver = IvSolver::new(cfg.iv);

        let surface = build_surface(&mut solver, &market, &cfg);
        let strikes: Vec<f64> = surface
            .quotes(date(2026, 11, 20))
            .iter()
            .map(|q| q.strike)
            .collect();
        assert_eq!(strikes, vec![100.0]);
    }

    #[test]
    fn test_atm_lookup() {
        let cfg = MakerConfig::default();
        let market = synthetic_market(101.2, 0.25, &cfg);
        let mut solver = IvSolver::new(cfg.iv);
        let surface = build_surface(&mut solver, &market, &cfg);

        let atm = surface.atm(date(2026, 11, 20), 101.2).unwrap();
        assert_eq!(atm.strike, 100.0);
    }

    #[test]
    fn test_iv_at_exact_lookup() {
        let mut surface = VolSurface::new(100.0, date(2026, 8, 3));
        surface.insert(VolQuote {
            expiry: date(2026, 11, 20),
            strike: 105.0,
            option_type: OptionType::Call,
            sigma: 0.3,
            status: IvStatus::Converged,
            solved_at: Utc::now(),
        });
        assert!(surface.iv_at(date(2026, 11, 20), 105.0).is_some());
        assert!(surface.iv_at(date(2026, 11, 20), 106.0).is_none());
        assert!(surface.iv_at(date(2026, 12, 18), 105.0).is_none());
    }
}
