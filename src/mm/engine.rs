//! Per-tick orchestration
//!
//! Drives one synchronous decision cycle per market snapshot:
//! AwaitingSnapshot -> Quoting -> FillSimulation -> RiskUpdate ->
//! HedgeEvaluation, then back to AwaitingSnapshot. Phases never overlap and
//! every tick completes before the next begins; the loop binary owns the
//! cadence and the snapshot source.
//!
//! Failure scoping: a contract that cannot be quoted is skipped with a
//! warning; an expiry with no hedge instrument is skipped for this tick; a
//! position that cannot be marked fails the whole tick (the caller logs it
//! and moves to the next snapshot).

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{MakerConfig, MakerError, MakerResult, MarketSnapshot};
use crate::data::EventLog;
use crate::ledger::{Fill, RiskBook, RiskSnapshot};
use crate::pricing::greeks;
use crate::surface::VolSurface;

use super::fills::FillSimulator;
use super::quote::{inventory_aware_quote, Quote};
use super::{delta_hedge, vega_hedge};

/// Phases of one decision cycle, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickPhase {
    AwaitingSnapshot,
    Quoting,
    FillSimulation,
    RiskUpdate,
    HedgeEvaluation,
}

impl TickPhase {
    /// The phase that follows this one; HedgeEvaluation wraps around to
    /// AwaitingSnapshot for the next tick.
    pub fn next(self) -> TickPhase {
        match self {
            TickPhase::AwaitingSnapshot => TickPhase::Quoting,
            TickPhase::Quoting => TickPhase::FillSimulation,
            TickPhase::FillSimulation => TickPhase::RiskUpdate,
            TickPhase::RiskUpdate => TickPhase::HedgeEvaluation,
            TickPhase::HedgeEvaluation => TickPhase::AwaitingSnapshot,
        }
    }
}

/// What one tick did
#[derive(Debug, Clone)]
pub struct TickReport {
    pub spot: f64,
    pub quotes: usize,
    pub fills: usize,
    pub delta_hedges: usize,
    pub vega_hedges: usize,
    /// Risk state at the end of the tick
    pub risk: RiskSnapshot,
}

/// Owns the book, the fill simulator, and the event sinks; consumes a
/// market snapshot plus a prebuilt surface each tick.
pub struct MakerEngine {
    cfg: MakerConfig,
    book: RiskBook,
    fill_sim: FillSimulator,
    rng: StdRng,
    log: Option<EventLog>,
    phase: TickPhase,
}

impl MakerEngine {
    pub fn new(cfg: MakerConfig, book: RiskBook, seed: u64, log: Option<EventLog>) -> Self {
        let fill_sim = FillSimulator::new(cfg.fills);
        Self {
            cfg,
            book,
            fill_sim,
            rng: StdRng::seed_from_u64(seed),
            log,
            phase: TickPhase::AwaitingSnapshot,
        }
    }

    pub fn book(&self) -> &RiskBook {
        &self.book
    }

    pub fn into_book(self) -> RiskBook {
        self.book
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    fn enter(&mut self, phase: TickPhase) {
        self.phase = phase;
        debug!(phase = ?self.phase, "tick phase");
    }

    /// Run one full decision cycle against the given snapshot and surface.
    /// A failed tick leaves the engine back in AwaitingSnapshot so the next
    /// snapshot starts a clean cycle.
    pub fn run_tick(
        &mut self,
        market: &MarketSnapshot,
        surface: &VolSurface,
    ) -> MakerResult<TickReport> {
        let report = self.tick_cycle(market, surface);
        self.enter(TickPhase::AwaitingSnapshot);
        report
    }

    fn tick_cycle(
        &mut self,
        market: &MarketSnapshot,
        surface: &VolSurface,
    ) -> MakerResult<TickReport> {
        self.enter(TickPhase::Quoting);

        // Exposures feeding the quote skew come from the book as it stands
        // entering the tick, marked against this snapshot.
        let risk_entering = self.book.snapshot(market, surface, &self.cfg)?;

        let mut quotes: Vec<Quote> = Vec::new();
        for expiry in surface.expiries() {
            let time = market.time_to_expiry(expiry);
            let steps = self.cfg.adaptive_steps(time);
            for vq in surface
                .quotes(expiry)
                .iter()
                .take(self.cfg.quotes_per_expiry)
            {
                match inventory_aware_quote(
                    market.spot,
                    vq.strike,
                    self.cfg.rate,
                    self.cfg.dividend,
                    vq.sigma,
                    time,
                    steps,
                    vq.option_type,
                    self.cfg.exercise,
                    expiry,
                    &risk_entering,
                    &self.cfg.quoting,
                ) {
                    Ok(q) => {
                        if q.fair_value_adjusted < self.cfg.min_quote_value || q.bid >= q.ask {
                            continue;
                        }
                        if let Some(log) = &mut self.log {
                            log.log_quote(&q)?;
                        }
                        quotes.push(q);
                    }
                    Err(e) => {
                        warn!(strike = vq.strike, %e, "quote skipped");
                    }
                }
            }
        }

        self.enter(TickPhase::FillSimulation);
        let mut fills = 0usize;
        for q in &quotes {
            let sim = match self.fill_sim.simulate(&mut self.rng, q) {
                Some(s) => s,
                None => continue,
            };
            let time = market.time_to_expiry(q.expiry);
            let steps = self.cfg.adaptive_steps(time);
            let point = match greeks::greeks(
                market.spot,
                q.strike,
                self.cfg.rate,
                self.cfg.dividend,
                q.iv,
                time,
                steps,
                q.option_type,
                self.cfg.exercise,
                &self.cfg.bumps,
            ) {
                Ok(p) => p,
                Err(e) => {
                    warn!(strike = q.strike, %e, "fill skipped: greeks unavailable");
                    continue;
                }
            };
            let fill = Fill {
                ts: Utc::now(),
                expiry: q.expiry,
                strike: q.strike,
                option_type: q.option_type,
                side: sim.side,
                qty: sim.qty,
                price: sim.price,
                spot: market.spot,
                delta: point.delta,
                vega: point.vega,
            };
            if let Some(log) = &mut self.log {
                log.log_fill(&fill)?;
            }
            info!(
                expiry = %q.expiry,
                strike = q.strike,
                side = ?fill.side,
                price = fill.price,
                "fill"
            );
            self.book.apply_fill(fill);
            fills += 1;
        }

        self.enter(TickPhase::RiskUpdate);
        let mut risk = self.book.snapshot(market, surface, &self.cfg)?;

        self.enter(TickPhase::HedgeEvaluation);
        let mut vega_hedges = 0usize;
        for expiry in surface.expiries() {
            match vega_hedge(&risk, expiry, market, surface, &self.cfg) {
                Ok(Some(hedge)) => {
                    if let Some(log) = &mut self.log {
                        log.log_hedge(&hedge)?;
                    }
                    info!(
                        %expiry,
                        qty = hedge.qty,
                        instrument = %hedge.instrument,
                        "vega hedge"
                    );
                    self.book.apply_hedge(hedge);
                    vega_hedges += 1;
                }
                Ok(None) => {}
                Err(MakerError::HedgeInfeasible { expiry }) => {
                    warn!(%expiry, "vega hedge skipped: no ATM instrument");
                }
                Err(e) => return Err(e),
            }
        }
        if vega_hedges > 0 {
            // Option hedges moved delta; re-derive before the delta pass
            risk = self.book.snapshot(market, surface, &self.cfg)?;
        }

        let mut delta_hedges = 0usize;
        if let Some(hedge) = delta_hedge(&risk, market, &self.cfg) {
            if let Some(log) = &mut self.log {
                log.log_hedge(&hedge)?;
            }
            info!(qty = hedge.qty, spot = market.spot, "delta hedge");
            self.book.apply_hedge(hedge);
            delta_hedges += 1;
            risk = self.book.snapshot(market, surface, &self.cfg)?;
        }

        Ok(TickReport {
            spot: market.spot,
            quotes: quotes.len(),
            fills,
            delta_hedges,
            vega_hedges,
            risk,
        })
    }
}
