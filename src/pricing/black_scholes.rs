//! Black-Scholes closed form
//!
//! European reference pricer used to cross-check the lattice. Production
//! pricing, Greeks, and implied vol all run through the lattice so American
//! exercise is handled consistently; nothing outside tests should need this.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::core::OptionType;

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).unwrap();
    normal.cdf(x)
}

/// Black-Scholes European option price with continuous dividend yield
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> f64 {
    if time <= 0.0 {
        return option_type.intrinsic(spot, strike);
    }
    if vol <= 0.0 {
        // Zero vol: discounted forward intrinsic
        let forward = spot * ((rate - dividend) * time).exp();
        let df = (-rate * time).exp();
        return df * option_type.intrinsic(forward, strike);
    }

    let forward = spot * ((rate - dividend) * time).exp();
    let sqrt_t = time.sqrt();
    let d1 = ((forward / strike).ln() + 0.5 * vol * vol * time) / (vol * sqrt_t);
    let d2 = d1 - vol * sqrt_t;
    let df = (-rate * time).exp();

    match option_type {
        OptionType::Call => df * (forward * norm_cdf(d1) - strike * norm_cdf(d2)),
        OptionType::Put => df * (strike * norm_cdf(-d2) - forward * norm_cdf(-d1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-10);
        assert!((norm_cdf(1.96) - 0.975).abs() < 0.001);
    }

    #[test]
    fn test_known_atm_value() {
        // ATM call, 20% vol, 1 year, 5% rate: ~10.45
        let c = price(100.0, 100.0, 0.05, 0.0, 0.20, 1.0, OptionType::Call);
        assert!(c > 10.0 && c < 11.0, "unexpected price {c}");
    }

    #[test]
    fn test_put_call_parity() {
        let (s, k, r, q, vol, t) = (100.0, 100.0, 0.05, 0.0, 0.20, 1.0);
        let c = price(s, k, r, q, vol, t, OptionType::Call);
        let p = price(s, k, r, q, vol, t, OptionType::Put);
        let df = (-r * t).exp();
        let forward = s * ((r - q) * t).exp();
        assert!((c - p - df * (forward - k)).abs() < 1e-9);
    }
}
