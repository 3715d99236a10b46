//! Book events and derived risk state
//!
//! Fills and hedge trades are append-only records; each one also mutates a
//! position. The risk snapshot is derived on demand by replaying current
//! positions against a market snapshot; it is never stored as truth.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{InstrumentId, OptionType};

/// Trade side from the book's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn signum(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

/// One option fill against our quotes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub ts: DateTime<Utc>,
    pub expiry: NaiveDate,
    pub strike: f64,
    pub option_type: OptionType,
    pub side: Side,
    /// Contracts, always positive; direction is `side`
    pub qty: u32,
    pub price: f64,
    /// Spot at the moment of the fill
    pub spot: f64,
    /// Per-option delta at the moment of the fill
    pub delta: f64,
    /// Per-option vega at the moment of the fill
    pub vega: f64,
}

impl Fill {
    pub fn instrument(&self) -> InstrumentId {
        InstrumentId::option(self.expiry, self.strike, self.option_type)
    }

    /// Signed contract quantity (buy positive)
    pub fn signed_qty(&self) -> f64 {
        self.side.signum() * self.qty as f64
    }
}

/// Hedge classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HedgeKind {
    Delta,
    Vega,
}

/// One corrective hedge trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeTrade {
    pub ts: DateTime<Utc>,
    pub kind: HedgeKind,
    pub instrument: InstrumentId,
    /// Signed quantity: shares for delta hedges, contracts for vega hedges
    pub qty: f64,
    pub price: f64,
    pub spot: f64,
}

/// Derived exposure and PnL state for one market snapshot.
///
/// Deltas are share-equivalent; vega is per-option units times contract
/// quantity, grouped by expiry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    /// Options-only delta, in share equivalents
    pub delta_options: f64,
    /// Options delta plus underlying shares
    pub delta_total: f64,
    /// Net vega per expiry
    pub vega_by_expiry: BTreeMap<NaiveDate, f64>,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
}

impl RiskSnapshot {
    pub fn vega_for(&self, expiry: NaiveDate) -> f64 {
        self.vega_by_expiry.get(&expiry).copied().unwrap_or(0.0)
    }

    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }
}
