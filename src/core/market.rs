//! Market snapshot input
//!
//! Read-only per-tick market data handed to the core by the data feed:
//! spot price plus one quote chain per expiry. The core never mutates a
//! snapshot; everything downstream takes it as an explicit parameter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::contract::OptionType;

/// Calendar year fraction from `from` to `to` (days / 365), floored at a
/// tiny minimum so time-to-expiry never reaches zero inside the pricer.
pub fn yearfrac(from: NaiveDate, to: NaiveDate) -> f64 {
    ((to - from).num_days() as f64 / 365.0).max(1e-6)
}

/// One quoted strike in a chain
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrikeQuote {
    pub strike: f64,
    pub option_type: OptionType,
    /// Best bid; non-positive means no bid
    pub bid: f64,
    /// Best ask; non-positive means no ask
    pub ask: f64,
}

impl StrikeQuote {
    /// Mid price, if both sides are live
    pub fn mid(&self) -> Option<f64> {
        if self.bid > 0.0 && self.ask > 0.0 {
            Some(0.5 * (self.bid + self.ask))
        } else {
            None
        }
    }

    /// Moneyness as strike / spot
    pub fn moneyness(&self, spot: f64) -> f64 {
        self.strike / spot
    }
}

/// Quote chain for a single expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub expiry: NaiveDate,
    /// Quotes sorted by strike
    pub quotes: Vec<StrikeQuote>,
}

impl ChainSnapshot {
    pub fn new(expiry: NaiveDate, mut quotes: Vec<StrikeQuote>) -> Self {
        quotes.sort_by(|a, b| a.strike.total_cmp(&b.strike));
        Self { expiry, quotes }
    }

    /// Quotes with both sides live and within the given moneyness band
    pub fn liquid_quotes(&self, spot: f64, mny_min: f64, mny_max: f64) -> Vec<&StrikeQuote> {
        self.quotes
            .iter()
            .filter(|q| q.mid().is_some())
            .filter(|q| {
                let m = q.moneyness(spot);
                m >= mny_min && m <= mny_max
            })
            .collect()
    }
}

/// Full market snapshot for one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Underlying spot price
    pub spot: f64,
    /// Valuation date used for time-to-expiry
    pub as_of: NaiveDate,
    /// Chains by expiry, sorted
    pub chains: Vec<ChainSnapshot>,
    /// Capture time
    pub timestamp: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(spot: f64, as_of: NaiveDate, mut chains: Vec<ChainSnapshot>) -> Self {
        chains.sort_by_key(|c| c.expiry);
        Self {
            spot,
            as_of,
            chains,
            timestamp: Utc::now(),
        }
    }

    /// Time to expiry in years from this snapshot's valuation date
    pub fn time_to_expiry(&self, expiry: NaiveDate) -> f64 {
        yearfrac(self.as_of, expiry)
    }

    pub fn expiries(&self) -> Vec<NaiveDate> {
        self.chains.iter().map(|c| c.expiry).collect()
    }

    pub fn chain_for_expiry(&self, expiry: NaiveDate) -> Option<&ChainSnapshot> {
        self.chains.iter().find(|c| c.expiry == expiry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_yearfrac() {
        let t = yearfrac(date(2026, 1, 1), date(2027, 1, 1));
        assert!((t - 1.0).abs() < 0.01);

        // Never zero, even on the expiry date itself
        assert!(yearfrac(date(2026, 1, 1), date(2026, 1, 1)) > 0.0);
    }

    #[test]
    fn test_mid_requires_both_sides() {
        let q = StrikeQuote {
            strike: 100.0,
            option_type: OptionType::Call,
            bid: 1.0,
            ask: 1.2,
        };
        assert!((q.mid().unwrap() - 1.1).abs() < 1e-12);

        let dead = StrikeQuote { bid: 0.0, ..q };
        assert!(dead.mid().is_none());
    }

    #[test]
    fn test_liquid_quotes_filters_moneyness() {
        let mk = |strike: f64| StrikeQuote {
            strike,
            option_type: OptionType::Call,
            bid: 1.0,
            ask: 1.2,
        };
        let chain = ChainSnapshot::new(date(2026, 9, 18), vec![mk(50.0), mk(100.0), mk(200.0)]);

        let liquid = chain.liquid_quotes(100.0, 0.7, 1.3);
        assert_eq!(liquid.len(), 1);
        assert_eq!(liquid[0].strike, 100.0);
    }

    #[test]
    fn test_chains_sorted_by_expiry() {
        let snap = MarketSnapshot::new(
            100.0,
            date(2026, 8, 1),
            vec![
                ChainSnapshot::new(date(2026, 10, 16), vec![]),
                ChainSnapshot::new(date(2026, 9, 18), vec![]),
            ],
        );
        assert_eq!(
            snap.expiries(),
            vec![date(2026, 9, 18), date(2026, 10, 16)]
        );
    }
}
