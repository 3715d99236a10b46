//! Implied-volatility solver
//!
//! Inverts the lattice pricer by bracketed bisection. The solver owns an
//! explicit, bounded cache of last-solved vols keyed by (expiry, strike).
//! The cache only narrows the starting bracket: every call reprices against
//! the latest observed price, and cache updates are an explicit step after
//! each solve, never an implicit memoization.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{ExerciseStyle, IvConfig, MakerResult, OptionType};

use super::lattice;

/// Outcome classification for one solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IvStatus {
    /// Bisection converged within tolerance
    Converged,
    /// Iteration cap hit; bracket midpoint returned as a degraded result
    Fallback,
    /// Observed price violates arbitrage bounds; no root-finding attempted
    Rejected,
}

/// Result of one solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IvOutcome {
    Converged(f64),
    Fallback(f64),
    Rejected,
}

impl IvOutcome {
    pub fn status(&self) -> IvStatus {
        match self {
            IvOutcome::Converged(_) => IvStatus::Converged,
            IvOutcome::Fallback(_) => IvStatus::Fallback,
            IvOutcome::Rejected => IvStatus::Rejected,
        }
    }

    /// Solved vol, if any
    pub fn sigma(&self) -> Option<f64> {
        match self {
            IvOutcome::Converged(s) | IvOutcome::Fallback(s) => Some(*s),
            IvOutcome::Rejected => None,
        }
    }
}

/// Cache key: (expiry, strike in exact milli-units)
pub(crate) fn cache_key(expiry: NaiveDate, strike: f64) -> (NaiveDate, i64) {
    (expiry, (strike * 1000.0).round() as i64)
}

#[derive(Debug, Clone, Copy)]
struct CachedVol {
    sigma: f64,
    solved_at: DateTime<Utc>,
}

/// Contract and market inputs for one solve, minus the vol being sought
#[derive(Debug, Clone, Copy)]
pub struct IvRequest {
    pub expiry: NaiveDate,
    pub observed: f64,
    pub spot: f64,
    pub strike: f64,
    pub rate: f64,
    pub dividend: f64,
    pub time: f64,
    pub steps: usize,
    pub option_type: OptionType,
    pub exercise: ExerciseStyle,
}

/// Pure bracketed-bisection solve. No cache access; `hint` (a previously
/// solved vol for the same key, if any) narrows the starting bracket.
///
/// Order of operations:
/// 1. bounds check against the full [sigma_low, sigma_high] price range;
///    an observed price outside it is rejected before any bisection;
/// 2. warm-start bracket around the hint, geometrically expanded (bounded
///    number of times) until it straddles the observed price;
/// 3. bisection until the price error or bracket width is within tolerance;
///    hitting the iteration cap returns the midpoint as a fallback.
pub fn solve_bracketed(req: &IvRequest, hint: Option<f64>, cfg: &IvConfig) -> MakerResult<IvOutcome> {
    let price_at = |sigma: f64| -> MakerResult<f64> {
        lattice::price(
            req.spot,
            req.strike,
            req.rate,
            req.dividend,
            sigma,
            req.time,
            req.steps,
            req.option_type,
            req.exercise,
        )
    };

    // The configured bracket floor, raised to the lattice's own validity
    // floor at this step width (below it the risk-neutral probability
    // leaves (0, 1) and pricing fails outright).
    let sigma_low = cfg
        .sigma_low
        .max(lattice::vol_floor(req.rate, req.dividend, req.time, req.steps));

    // Theoretical price range: sigma -> 0 and sigma -> infinity proxies
    let floor = price_at(sigma_low)?;
    let cap = price_at(cfg.sigma_high)?;
    let reject_tol = 1e-9 * (1.0 + req.observed.abs());
    if req.observed < floor - reject_tol || req.observed > cap + reject_tol {
        return Ok(IvOutcome::Rejected);
    }

    // Starting bracket: warm-started around the hint when available
    let (mut a, mut b) = match hint {
        Some(h) if h > sigma_low && h < cfg.sigma_high => (
            (h * (1.0 - cfg.warm_band)).max(sigma_low),
            (h * (1.0 + cfg.warm_band)).min(cfg.sigma_high),
        ),
        _ => (sigma_low, cfg.sigma_high),
    };

    // Expand geometrically until the bracket straddles the observed price.
    // The full-range check above guarantees this terminates within bounds.
    let mut p_a = price_at(a)?;
    let mut p_b = price_at(b)?;
    let mut expansions = 0;
    while (req.observed < p_a || req.observed > p_b) && expansions < cfg.max_expansions {
        if req.observed < p_a {
            a = (a * 0.5).max(sigma_low);
            p_a = price_at(a)?;
        }
        if req.observed > p_b {
            b = (b * 2.0).min(cfg.sigma_high);
            p_b = price_at(b)?;
        }
        expansions += 1;
    }
    if req.observed < p_a || req.observed > p_b {
        // Expansion cap hit without straddling; fall back to the full
        // bracket, which is guaranteed to contain the root.
        a = sigma_low;
        b = cfg.sigma_high;
    }

    // Bisection on vol; the lattice price is monotone increasing in vol
    for _ in 0..cfg.max_iterations {
        let mid = 0.5 * (a + b);
        let p_mid = price_at(mid)?;
        let err = p_mid - req.observed;
        if err.abs() < cfg.price_tol || (b - a) < cfg.vol_tol {
            return Ok(IvOutcome::Converged(mid));
        }
        if err > 0.0 {
            b = mid;
        } else {
            a = mid;
        }
    }

    Ok(IvOutcome::Fallback(0.5 * (a + b)))
}

/// Stateful solver owning the warm-start cache
#[derive(Debug)]
pub struct IvSolver {
    cfg: IvConfig,
    cache: HashMap<(NaiveDate, i64), CachedVol>,
}

impl IvSolver {
    pub fn new(cfg: IvConfig) -> Self {
        Self {
            cfg,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &IvConfig {
        &self.cfg
    }

    /// Previously solved vol for (expiry, strike), if cached
    pub fn hint(&self, expiry: NaiveDate, strike: f64) -> Option<f64> {
        self.cache
            .get(&cache_key(expiry, strike))
            .map(|c| c.sigma)
    }

    /// Solve for implied vol, warm-starting from and then updating the cache.
    /// Rejected prices never touch the cache.
    pub fn solve(&mut self, req: &IvRequest) -> MakerResult<IvOutcome> {
        let hint = self.hint(req.expiry, req.strike);
        let outcome = solve_bracketed(req, hint, &self.cfg)?;
        if let Some(sigma) = outcome.sigma() {
            self.remember(req.expiry, req.strike, sigma);
        }
        Ok(outcome)
    }

    /// Explicit cache update. Bounded: at capacity the oldest solve is
    /// evicted before inserting a new key.
    pub fn remember(&mut self, expiry: NaiveDate, strike: f64, sigma: f64) {
        let key = cache_key(expiry, strike);
        if !self.cache.contains_key(&key) && self.cache.len() >= self.cfg.cache_capacity {
            if let Some(oldest) = self
                .cache
                .iter()
                .min_by_key(|(_, v)| v.solved_at)
                .map(|(k, _)| *k)
            {
                self.cache.remove(&oldest);
            }
        }
        self.cache.insert(
            key,
            CachedVol {
                sigma,
                solved_at: Utc::now(),
            },
        );
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
