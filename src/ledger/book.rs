//! Risk and inventory book
//!
//! Single owner of positions, event logs, and the realized-PnL accumulator.
//! All mutation goes through `apply_fill` / `apply_hedge`, sequentially
//! within a tick. Exposures are never accumulated incrementally: `snapshot`
//! replays current positions through the Greek estimator against the market
//! snapshot it is given, so reported risk cannot drift from inventory.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{InstrumentId, MakerConfig, MakerError, MakerResult, MarketSnapshot};
use crate::pricing::{greeks, lattice};
use crate::surface::VolSurface;

use super::events::{Fill, HedgeTrade, RiskSnapshot};
use super::position::Position;

/// Positions, event history, and realized PnL for one trading session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBook {
    positions: BTreeMap<InstrumentId, Position>,
    fills: Vec<Fill>,
    hedges: Vec<HedgeTrade>,
    realized_pnl: f64,
    /// Shares per option contract
    contract_multiplier: f64,
}

impl RiskBook {
    pub fn new(contract_multiplier: f64) -> Self {
        Self {
            positions: BTreeMap::new(),
            fills: Vec::new(),
            hedges: Vec::new(),
            realized_pnl: 0.0,
            contract_multiplier,
        }
    }

    pub fn contract_multiplier(&self) -> f64 {
        self.contract_multiplier
    }

    pub fn positions(&self) -> &BTreeMap<InstrumentId, Position> {
        &self.positions
    }

    pub fn position(&self, id: &InstrumentId) -> Option<&Position> {
        self.positions.get(id)
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn hedges(&self) -> &[HedgeTrade] {
        &self.hedges
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Payoff units per quantity unit for an instrument: contract
    /// multiplier for option legs, 1 for shares.
    fn payoff_units(&self, id: &InstrumentId) -> f64 {
        if id.is_underlying() {
            1.0
        } else {
            self.contract_multiplier
        }
    }

    /// Record an option fill: mutate the leg's position at average cost,
    /// realize PnL on any reducing portion, append to the fill log.
    pub fn apply_fill(&mut self, fill: Fill) {
        let id = fill.instrument();
        let units = self.payoff_units(&id);
        let realized = self
            .positions
            .entry(id)
            .or_default()
            .apply(fill.signed_qty(), fill.price)
            * units;
        self.realized_pnl += realized;
        debug!(
            instrument = %id,
            qty = fill.signed_qty(),
            price = fill.price,
            realized,
            "fill applied"
        );
        self.fills.push(fill);
    }

    /// Record a hedge trade: identical position mutation to a fill, tagged
    /// separately for reporting.
    pub fn apply_hedge(&mut self, hedge: HedgeTrade) {
        let units = self.payoff_units(&hedge.instrument);
        let realized = self
            .positions
            .entry(hedge.instrument)
            .or_default()
            .apply(hedge.qty, hedge.price)
            * units;
        self.realized_pnl += realized;
        debug!(
            instrument = %hedge.instrument,
            kind = ?hedge.kind,
            qty = hedge.qty,
            price = hedge.price,
            realized,
            "hedge applied"
        );
        self.hedges.push(hedge);
    }

    /// Derive the risk snapshot for the given market state.
    ///
    /// Every non-flat position is marked: option legs through the surface
    /// IV, the lattice, and the Greek estimator; the underlying at spot with
    /// delta one per share. A position that cannot be marked fails the whole
    /// snapshot naming the instrument; a partial aggregate would silently
    /// misstate exposure.
    pub fn snapshot(
        &self,
        market: &MarketSnapshot,
        surface: &VolSurface,
        cfg: &MakerConfig,
    ) -> MakerResult<RiskSnapshot> {
        let mut snap = RiskSnapshot {
            realized_pnl: self.realized_pnl,
            ..RiskSnapshot::default()
        };

        for (id, pos) in &self.positions {
            if pos.is_flat() {
                continue;
            }
            match id {
                InstrumentId::Underlying => {
                    snap.unrealized_pnl += pos.unrealized(market.spot);
                }
                InstrumentId::OptionLeg {
                    expiry,
                    option_type,
                    ..
                } => {
                    let strike = id.strike().unwrap_or_default();
                    let vol = surface
                        .iv_at(*expiry, strike)
                        .map(|q| q.sigma)
                        .ok_or_else(|| {
                            MakerError::mark_failure(
                                id.to_string(),
                                "no implied vol on surface",
                            )
                        })?;
                    let time = market.time_to_expiry(*expiry);

                    let point = greeks::greeks(
                        market.spot,
                        strike,
                        cfg.rate,
                        cfg.dividend,
                        vol,
                        time,
                        cfg.steps,
                        *option_type,
                        cfg.exercise,
                        &cfg.bumps,
                    )
                    .map_err(|e| MakerError::mark_failure(id.to_string(), e.to_string()))?;

                    let mark = lattice::price(
                        market.spot,
                        strike,
                        cfg.rate,
                        cfg.dividend,
                        vol,
                        time,
                        cfg.steps,
                        *option_type,
                        cfg.exercise,
                    )
                    .map_err(|e| MakerError::mark_failure(id.to_string(), e.to_string()))?;

                    snap.delta_options += pos.qty * point.delta * self.contract_multiplier;
                    *snap.vega_by_expiry.entry(*expiry).or_default() += pos.qty * point.vega;
                    snap.unrealized_pnl += pos.unrealized(mark) * self.contract_multiplier;
                }
            }
        }

        let underlying_shares = self
            .positions
            .get(&InstrumentId::Underlying)
            .map(|p| p.qty)
            .unwrap_or(0.0);
        snap.delta_total = snap.delta_options + underlying_shares;
        Ok(snap)
    }

    /// Persist positions, both event logs, and realized PnL. Callers must
    /// not invoke this while a tick is mutating the book (`&self` plus the
    /// single-owner rule make that structural).
    pub fn save(&self, path: impl AsRef<Path>) -> MakerResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Restore a previously saved book
    pub fn load(path: impl AsRef<Path>) -> MakerResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Restore if a saved state exists, otherwise start a fresh book
    pub fn load_or_new(path: impl AsRef<Path>, contract_multiplier: f64) -> MakerResult<Self> {
        match fs::read_to_string(path.as_ref()) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::new(contract_multiplier))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChainSnapshot, OptionType, StrikeQuote};
    use crate::ledger::events::{HedgeKind, Side};
    use crate::pricing::IvSolver;
    use crate::surface::build_surface;
    use chrono::{NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expiry() -> NaiveDate {
        date(2026, 11, 20)
    }

    /// Market + surface where mids are exact lattice prices at 25% vol
    fn fixture(cfg: &MakerConfig) -> (MarketSnapshot, VolSurface) {
        let as_of = date(2026, 8, 3);
        let time = crate::core::yearfrac(as_of, expiry());
        let quotes = [95.0, 100.0, 105.0]
            .iter()
            .map(|&strike| {
                let theo = lattice::price(
                    100.0,
                    strike,
                    cfg.rate,
                    cfg.dividend,
                    0.25,
                    time,
                    cfg.steps,
                    OptionType::Call,
                    cfg.exercise,
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
        let market =
            MarketSnapshot::new(100.0, as_of, vec![ChainSnapshot::new(expiry(), quotes)]);
        let mut solver = IvSolver::new(cfg.iv);
        let surface = build_surface(&mut solver, &market, cfg);
        (market, surface)
    }

    fn fill(side: Side, qty: u32, price: f64, delta: f64, vega: f64) -> Fill {
        Fill {
            ts: Utc::now(),
            expiry: expiry(),
            strike: 100.0,
            option_type: OptionType::Call,
            side,
            qty,
            price,
            spot: 100.0,
            delta,
            vega,
        }
    }

    #[test]
    fn test_fill_round_trip_realizes_pnl() {
        let mut book = RiskBook::new(100.0);
        book.apply_fill(fill(Side::Buy, 2, 5.0, 0.5, 0.2));
        book.apply_fill(fill(Side::Sell, 2, 6.0, 0.5, 0.2));

        // (6 - 5) * 2 contracts * 100 multiplier
        assert!((book.realized_pnl() - 200.0).abs() < 1e-9);
        let id = InstrumentId::option(expiry(), 100.0, OptionType::Call);
        assert!(book.position(&id).unwrap().is_flat());
        assert_eq!(book.fills().len(), 2);
    }

    #[test]
    fn test_share_hedge_realizes_pnl() {
        let mut book = RiskBook::new(100.0);
        let buy = HedgeTrade {
            ts: Utc::now(),
            kind: HedgeKind::Delta,
            instrument: InstrumentId::Underlying,
            qty: 50.0,
            price: 100.0,
            spot: 100.0,
        };
        let sell = HedgeTrade {
            qty: -50.0,
            price: 101.0,
            ..buy.clone()
        };
        book.apply_hedge(buy);
        book.apply_hedge(sell);
        // (101 - 100) * 50 shares, multiplier 1
        assert!((book.realized_pnl() - 50.0).abs() < 1e-9);
        assert_eq!(book.hedges().len(), 2);
    }

    #[test]
    fn test_fill_moves_delta_by_estimator_delta() {
        let cfg = MakerConfig::default();
        let (market, surface) = fixture(&cfg);
        let mut book = RiskBook::new(cfg.contract_multiplier);

        let before = book.snapshot(&market, &surface, &cfg).unwrap();
        assert_eq!(before.delta_total, 0.0);

        let time = market.time_to_expiry(expiry());
        let vol = surface.iv_at(expiry(), 100.0).unwrap().sigma;
        let point = greeks::greeks(
            100.0,
            100.0,
            cfg.rate,
            cfg.dividend,
            vol,
            time,
            cfg.steps,
            OptionType::Call,
            cfg.exercise,
            &cfg.bumps,
        )
        .unwrap();

        book.apply_fill(fill(Side::Buy, 1, 5.0, point.delta, point.vega));
        let after = book.snapshot(&market, &surface, &cfg).unwrap();

        let expected = point.delta * cfg.contract_multiplier;
        // Tolerance on the order of the finite-difference bump
        assert!(
            (after.delta_total - expected).abs() < cfg.bumps.spot_rel * 100.0 * 2.0,
            "delta moved {} expected {}",
            after.delta_total,
            expected
        );
        assert!(after.vega_for(expiry()) > 0.0);
    }

    #[test]
    fn test_snapshot_fails_naming_unmarkable_instrument() {
        let cfg = MakerConfig::default();
        let (market, surface) = fixture(&cfg);
        let mut book = RiskBook::new(cfg.contract_multiplier);

        // Strike 120 has no surface point
        let mut f = fill(Side::Buy, 1, 1.0, 0.2, 0.1);
        f.strike = 120.0;
        book.apply_fill(f);

        let err = book.snapshot(&market, &surface, &cfg).unwrap_err();
        match err {
            MakerError::MarkFailure { instrument, .. } => {
                assert!(instrument.contains("120"), "got {instrument}");
            }
            other => panic!("expected MarkFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_persist_restore_replays_identical_snapshot() {
        let cfg = MakerConfig::default();
        let (market, surface) = fixture(&cfg);
        let mut book = RiskBook::new(cfg.contract_multiplier);

        book.apply_fill(fill(Side::Buy, 3, 5.0, 0.55, 0.25));
        book.apply_fill(fill(Side::Sell, 1, 5.4, 0.55, 0.25));
        let mut f = fill(Side::Sell, 2, 2.1, 0.3, 0.2);
        f.strike = 105.0;
        book.apply_fill(f);
        book.apply_hedge(HedgeTrade {
            ts: Utc::now(),
            kind: HedgeKind::Delta,
            instrument: InstrumentId::Underlying,
            qty: -40.0,
            price: 100.0,
            spot: 100.0,
        });

        let dir = std::env::temp_dir().join("lattice_maker_book_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("risk_state.json");
        book.save(&path).unwrap();

        let restored = RiskBook::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.fills().len(), book.fills().len());
        let original = book.snapshot(&market, &surface, &cfg).unwrap();
        let replayed = restored.snapshot(&market, &surface, &cfg).unwrap();
        assert_eq!(original, replayed);
    }

    #[test]
    fn test_load_or_new_without_state() {
        let book = RiskBook::load_or_new("/nonexistent/dir/risk_state.json", 100.0);
        assert!(book.is_ok());
        assert_eq!(book.unwrap().fills().len(), 0);
    }
}
