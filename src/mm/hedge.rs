//! Delta and soft vega hedging
//!
//! Both policies are pure functions of the current risk snapshot plus the
//! pricing stack; they emit corrective trades and never mutate the book
//! themselves. Delta hedges trade the underlying toward flat. Vega hedges
//! trade the at-the-money option of the SAME expiry (crossing expiries
//! would swap vega risk for term-structure basis risk), and only a fraction
//! of the excess, so the book drifts back inside the band without
//! oscillating across it.

use chrono::{NaiveDate, Utc};

use crate::core::{InstrumentId, MakerConfig, MakerError, MakerResult, MarketSnapshot};
use crate::ledger::{HedgeKind, HedgeTrade, RiskSnapshot};
use crate::pricing::{greeks, lattice};
use crate::surface::VolSurface;

/// Share trade that brings total delta to (near) zero, if the exposure
/// exceeds the configured threshold.
pub fn delta_hedge(
    risk: &RiskSnapshot,
    market: &MarketSnapshot,
    cfg: &MakerConfig,
) -> Option<HedgeTrade> {
    if risk.delta_total.abs() <= cfg.hedging.delta_threshold_shares {
        return None;
    }
    let shares = -risk.delta_total.round();
    if shares == 0.0 {
        return None;
    }
    Some(HedgeTrade {
        ts: Utc::now(),
        kind: HedgeKind::Delta,
        instrument: InstrumentId::Underlying,
        qty: shares,
        price: market.spot,
        spot: market.spot,
    })
}

/// Soft vega hedge for one expiry.
///
/// Returns `Ok(None)` when the exposure is inside the band or the sized
/// trade rounds to zero contracts; `HedgeInfeasible` when the expiry has no
/// usable ATM point on the surface (caller skips this expiry and retries
/// next tick).
pub fn vega_hedge(
    risk: &RiskSnapshot,
    expiry: NaiveDate,
    market: &MarketSnapshot,
    surface: &VolSurface,
    cfg: &MakerConfig,
) -> MakerResult<Option<HedgeTrade>> {
    let exposure = risk.vega_for(expiry);
    let excess = exposure.abs() - cfg.hedging.vega_band;
    if excess <= 0.0 {
        return Ok(None);
    }

    // ATM instrument in the SAME expiry
    let atm = surface
        .atm(expiry, market.spot)
        .ok_or(MakerError::HedgeInfeasible { expiry })?;
    let time = market.time_to_expiry(expiry);
    let option_type = cfg.hedging.hedge_option_type;

    let vega_per_option = greeks::vega(
        market.spot,
        atm.strike,
        cfg.rate,
        cfg.dividend,
        atm.sigma,
        time,
        cfg.steps,
        option_type,
        cfg.exercise,
        &cfg.bumps,
    )?;
    // Book vega is per-option units times contract quantity, so contracts
    // are sized directly by per-option vega.
    if vega_per_option.abs() < 1e-6 {
        return Ok(None);
    }

    // Long vega -> sell some; short vega -> buy some. Only a fraction of
    // the excess, capped per action.
    let target_change = -exposure.signum() * cfg.hedging.vega_hedge_fraction * excess;
    let contracts = (target_change / vega_per_option).round();
    let capped = contracts
        .abs()
        .min(cfg.hedging.vega_max_contracts as f64)
        * contracts.signum();
    if capped == 0.0 {
        return Ok(None);
    }

    let price = lattice::price(
        market.spot,
        atm.strike,
        cfg.rate,
        cfg.dividend,
        atm.sigma,
        time,
        cfg.steps,
        option_type,
        cfg.exercise,
    )?;

    Ok(Some(HedgeTrade {
        ts: Utc::now(),
        kind: HedgeKind::Vega,
        instrument: InstrumentId::option(expiry, atm.strike, option_type),
        qty: capped,
        price,
        spot: market.spot,
    }))
}
