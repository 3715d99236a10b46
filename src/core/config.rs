//! Configuration for the pricing / quoting / hedging pipeline
//!
//! Every tunable the loop consumes lives here, grouped per component and
//! aggregated in [`MakerConfig`]. All values are externally overridable;
//! defaults reproduce a small paper-trading setup.

use serde::{Deserialize, Serialize};

use super::contract::{ExerciseStyle, OptionType};

/// Finite-difference bump sizes for the Greek estimator.
///
/// Too small a bump amplifies lattice discreteness noise; too large a bump
/// introduces curvature bias.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GreekBumps {
    /// Relative spot bump for delta: h = spot_rel * S
    /// Default: 1e-2
    pub spot_rel: f64,

    /// Absolute volatility bump for vega
    /// Default: 1e-4
    pub vol_abs: f64,
}

impl Default for GreekBumps {
    fn default() -> Self {
        Self {
            spot_rel: 1e-2,
            vol_abs: 1e-4,
        }
    }
}

/// Implied-volatility solver configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IvConfig {
    /// Lower edge of the default volatility bracket
    /// Default: 1e-4
    pub sigma_low: f64,

    /// Upper edge of the default volatility bracket
    /// Default: 5.0 (500% vol, effectively the sigma -> infinity proxy)
    pub sigma_high: f64,

    /// Price-matching tolerance for convergence
    /// Default: 1e-6
    pub price_tol: f64,

    /// Bracket-width tolerance on volatility
    /// Default: 1e-6
    pub vol_tol: f64,

    /// Bisection iteration cap; hitting it yields a fallback midpoint
    /// Default: 100
    pub max_iterations: usize,

    /// Relative half-width of the warm-start bracket around a cached vol
    /// Default: 0.5 (bracket = [hint/2, hint*3/2])
    pub warm_band: f64,

    /// Maximum geometric expansions of a bracket that fails to straddle
    /// Default: 8
    pub max_expansions: usize,

    /// Cache capacity in (expiry, strike) entries; oldest solve evicted
    /// Default: 1024
    pub cache_capacity: usize,
}

impl Default for IvConfig {
    fn default() -> Self {
        Self {
            sigma_low: 1e-4,
            sigma_high: 5.0,
            price_tol: 1e-6,
            vol_tol: 1e-6,
            max_iterations: 100,
            warm_band: 0.5,
            max_expansions: 8,
            cache_capacity: 1024,
        }
    }
}

/// Filters applied before IV solving during surface construction
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Minimum strike/spot ratio
    /// Default: 0.7
    pub moneyness_min: f64,

    /// Maximum strike/spot ratio
    /// Default: 1.3
    pub moneyness_max: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            moneyness_min: 0.7,
            moneyness_max: 1.3,
        }
    }
}

/// How the quoting edge is computed from the adjusted fair value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeMode {
    /// Edge is `edge_value` dollars per side
    Absolute,
    /// Edge is `edge_value` (a fraction) of the adjusted fair value per side
    Relative,
}

/// Quote generation configuration.
///
/// The inventory-bias formula is a policy choice: a linear penalty on the
/// book's share-equivalent delta and this expiry's vega, clamped to
/// `bias_cap`. Tune the coefficients; nothing here claims optimality.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Edge mode (absolute dollars or fraction of adjusted fair value)
    /// Default: Relative
    pub edge_mode: EdgeMode,

    /// Edge magnitude: dollars (Absolute) or fraction (Relative)
    /// Default: 0.005 (50 bps per side)
    pub edge_value: f64,

    /// Floor on the edge so it stays strictly positive
    /// Default: 0.02
    pub min_edge: f64,

    /// Dollar shift per share of net delta exposure
    /// Default: 1e-4
    pub delta_bias: f64,

    /// Dollar shift per unit of this expiry's vega exposure
    /// Default: 1e-2
    pub vega_bias: f64,

    /// Absolute cap on the inventory shift
    /// Default: 1.0
    pub bias_cap: f64,

    /// Floor on the adjusted fair value (never quote below a penny mid)
    /// Default: 0.01
    pub min_price: f64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            edge_mode: EdgeMode::Relative,
            edge_value: 0.005,
            min_edge: 0.02,
            delta_bias: 1e-4,
            vega_bias: 1e-2,
            bias_cap: 1.0,
            min_price: 0.01,
        }
    }
}

/// Hedging configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HedgeConfig {
    /// Hedge delta once |total delta| exceeds this many shares
    /// Default: 50.0
    pub delta_threshold_shares: f64,

    /// Acceptable per-expiry |vega| band (per 1.00 vol)
    /// Default: 5.0
    pub vega_band: f64,

    /// Fraction of the excess vega to hedge per action; never the full
    /// excess, to avoid oscillation
    /// Default: 0.5
    pub vega_hedge_fraction: f64,

    /// Cap on option contracts per vega-hedge action
    /// Default: 5
    pub vega_max_contracts: u32,

    /// Option type used for the ATM vega hedge
    /// Default: Call
    pub hedge_option_type: OptionType,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            delta_threshold_shares: 50.0,
            vega_band: 5.0,
            vega_hedge_fraction: 0.5,
            vega_max_contracts: 5,
            hedge_option_type: OptionType::Call,
        }
    }
}

/// Toy fill-simulation probabilities
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FillConfig {
    /// Probability someone lifts the ask (we sell)
    /// Default: 0.10
    pub prob_lift_ask: f64,

    /// Probability someone hits the bid (we buy)
    /// Default: 0.20
    pub prob_hit_bid: f64,

    /// Contracts per simulated fill
    /// Default: 1
    pub fill_size: u32,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            prob_lift_ask: 0.10,
            prob_hit_bid: 0.20,
            fill_size: 1,
        }
    }
}

/// Top-level configuration consumed by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Risk-free rate (annualized, continuous compounding)
    /// Default: 0.04
    pub rate: f64,

    /// Continuous dividend yield
    /// Default: 0.0
    pub dividend: f64,

    /// Baseline lattice step count
    /// Default: 300
    pub steps: usize,

    /// Exercise style assumed for listed options
    /// Default: American
    pub exercise: ExerciseStyle,

    /// Shares per option contract
    /// Default: 100.0
    pub contract_multiplier: f64,

    /// Strikes quoted per expiry each tick
    /// Default: 6
    pub quotes_per_expiry: usize,

    /// Quotes below this adjusted fair value are skipped
    /// Default: 0.02
    pub min_quote_value: f64,

    pub bumps: GreekBumps,
    pub iv: IvConfig,
    pub surface: SurfaceConfig,
    pub quoting: QuoteConfig,
    pub hedging: HedgeConfig,
    pub fills: FillConfig,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            rate: 0.04,
            dividend: 0.0,
            steps: 300,
            exercise: ExerciseStyle::American,
            contract_multiplier: 100.0,
            quotes_per_expiry: 6,
            min_quote_value: 0.02,
            bumps: GreekBumps::default(),
            iv: IvConfig::default(),
            surface: SurfaceConfig::default(),
            quoting: QuoteConfig::default(),
            hedging: HedgeConfig::default(),
            fills: FillConfig::default(),
        }
    }
}

impl MakerConfig {
    /// Scale lattice steps with maturity so short-dated contracts stay cheap
    /// without starving long-dated accuracy.
    pub fn adaptive_steps(&self, time: f64) -> usize {
        ((400.0 * time) as usize).clamp(150, 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = MakerConfig::default();
        assert!(cfg.quoting.min_edge > 0.0);
        assert!(cfg.hedging.vega_hedge_fraction > 0.0 && cfg.hedging.vega_hedge_fraction < 1.0);
        assert!(cfg.fills.prob_lift_ask + cfg.fills.prob_hit_bid <= 1.0);
        assert!(cfg.iv.sigma_low < cfg.iv.sigma_high);
    }

    #[test]
    fn test_adaptive_steps_bounds() {
        let cfg = MakerConfig::default();
        assert_eq!(cfg.adaptive_steps(0.01), 150);
        assert_eq!(cfg.adaptive_steps(1.0), 400);
        assert_eq!(cfg.adaptive_steps(10.0), 500);
    }
}
