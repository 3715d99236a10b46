//! Market-making loop driver
//!
//! Wires the synthetic feed, surface construction, and the tick engine
//! together for a fixed number of ticks, then persists the book and prints
//! a session summary. Tick errors are logged and skipped; only setup
//! failures abort the run.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};

use lattice_maker::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "mm_loop", about = "Run the options market-making simulation loop")]
struct Args {
    /// Number of ticks to run
    #[arg(long, default_value_t = 20)]
    ticks: usize,

    /// Rebuild the IV surface every N ticks
    #[arg(long, default_value_t = 5)]
    refresh_every: usize,

    /// Initial spot price
    #[arg(long, default_value_t = 100.0)]
    spot: f64,

    /// RNG seed for the feed and the fill simulation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Lattice steps for surface construction and risk marking
    #[arg(long, default_value_t = 300)]
    steps: usize,

    /// Path for persisted book state
    #[arg(long, default_value = "risk_state.json")]
    state: PathBuf,

    /// Directory for quote/fill/hedge event logs
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "session failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> MakerResult<()> {
    let mut cfg = MakerConfig::default();
    cfg.steps = args.steps;

    let as_of = Utc::now().date_naive();
    let sim_cfg = SimConfig {
        rate: cfg.rate,
        dividend: cfg.dividend,
        ..SimConfig::default()
    };
    let mut feed = SimFeed::new(sim_cfg, args.spot, as_of, args.seed);
    let mut solver = IvSolver::new(cfg.iv);

    let book = RiskBook::load_or_new(&args.state, cfg.contract_multiplier)?;
    if !book.fills().is_empty() {
        info!(
            fills = book.fills().len(),
            realized = book.realized_pnl(),
            "resumed saved book"
        );
    }
    let log = EventLog::open(&args.log_dir)?;
    let mut engine = MakerEngine::new(cfg.clone(), book, args.seed, Some(log));

    let mut market = feed.next_snapshot()?;
    let mut surface = build_surface(&mut solver, &market, &cfg);
    if surface.is_empty() {
        return Err(MakerError::data(
            "no implied vols solved; widen filters or check feed parameters",
        ));
    }
    info!(
        spot = market.spot,
        points = surface.len(),
        expiries = surface.expiries().len(),
        "initial surface built"
    );

    let mut fills = 0usize;
    let mut delta_hedges = 0usize;
    let mut vega_hedges = 0usize;
    let mut last_risk = RiskSnapshot::default();

    for tick in 0..args.ticks {
        if tick > 0 {
            market = feed.next_snapshot()?;
            if args.refresh_every > 0 && tick % args.refresh_every == 0 {
                let rebuilt = build_surface(&mut solver, &market, &cfg);
                if rebuilt.is_empty() {
                    warn!(tick, "surface rebuild produced no points; keeping previous");
                } else {
                    surface = rebuilt;
                }
            }
        }

        match engine.run_tick(&market, &surface) {
            Ok(report) => {
                fills += report.fills;
                delta_hedges += report.delta_hedges;
                vega_hedges += report.vega_hedges;
                info!(
                    tick,
                    spot = report.spot,
                    quotes = report.quotes,
                    fills = report.fills,
                    delta_sh = report.risk.delta_total,
                    pnl = report.risk.total_pnl(),
                    "tick complete"
                );
                last_risk = report.risk;
            }
            Err(e) => {
                // Per-tick failure: skip this snapshot, keep the session
                warn!(tick, %e, "tick failed; continuing");
            }
        }
    }

    let book = engine.into_book();
    book.save(&args.state)?;

    info!("--- session summary ---");
    info!(fills, delta_hedges, vega_hedges, "activity");
    info!(
        realized = last_risk.realized_pnl,
        unrealized = last_risk.unrealized_pnl,
        total = last_risk.total_pnl(),
        "pnl"
    );
    info!(delta_total_sh = last_risk.delta_total, "final exposure");
    for (expiry, vega) in &last_risk.vega_by_expiry {
        info!(%expiry, vega = *vega, "per-expiry vega");
    }
    for (id, pos) in book.positions() {
        if !pos.is_flat() {
            info!(
                instrument = %id,
                qty = pos.qty,
                avg = pos.avg_cost,
                "open position"
            );
        }
    }
    info!(state = %args.state.display(), "book persisted");
    Ok(())
}
