//! Append-only event sinks
//!
//! One JSON-lines file per event stream (quotes, fills, hedges) under a log
//! directory. The core only writes; rotation, retention, and analysis are
//! someone else's problem.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::core::{MakerResult, OptionType};
use crate::ledger::{Fill, HedgeKind, HedgeTrade, Side};
use crate::mm::Quote;

#[derive(Debug, Serialize)]
struct QuoteRow {
    ts: DateTime<Utc>,
    expiry: NaiveDate,
    strike: f64,
    option_type: OptionType,
    fair_value_adjusted: f64,
    bid: f64,
    ask: f64,
    iv: f64,
}

#[derive(Debug, Serialize)]
struct FillRow {
    ts: DateTime<Utc>,
    expiry: NaiveDate,
    strike: f64,
    side: Side,
    qty: u32,
    price: f64,
    spot: f64,
}

#[derive(Debug, Serialize)]
struct HedgeRow {
    ts: DateTime<Utc>,
    kind: HedgeKind,
    instrument: String,
    qty: f64,
    price: f64,
    spot: f64,
}

/// Open writers for the three event streams
#[derive(Debug)]
pub struct EventLog {
    quotes: BufWriter<File>,
    fills: BufWriter<File>,
    hedges: BufWriter<File>,
}

impl EventLog {
    /// Create (or append to) `quotes.jsonl`, `fills.jsonl`, `hedges.jsonl`
    /// under the given directory.
    pub fn open(dir: impl AsRef<Path>) -> MakerResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let open = |name: &str| -> MakerResult<BufWriter<File>> {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(name))?;
            Ok(BufWriter::new(file))
        };
        Ok(Self {
            quotes: open("quotes.jsonl")?,
            fills: open("fills.jsonl")?,
            hedges: open("hedges.jsonl")?,
        })
    }

    pub fn log_quote(&mut self, quote: &Quote) -> MakerResult<()> {
        let row = QuoteRow {
            ts: Utc::now(),
            expiry: quote.expiry,
            strike: quote.strike,
            option_type: quote.option_type,
            fair_value_adjusted: quote.fair_value_adjusted,
            bid: quote.bid,
            ask: quote.ask,
            iv: quote.iv,
        };
        writeln!(self.quotes, "{}", serde_json::to_string(&row)?)?;
        Ok(())
    }

    pub fn log_fill(&mut self, fill: &Fill) -> MakerResult<()> {
        let row = FillRow {
            ts: fill.ts,
            expiry: fill.expiry,
            strike: fill.strike,
            side: fill.side,
            qty: fill.qty,
            price: fill.price,
            spot: fill.spot,
        };
        writeln!(self.fills, "{}", serde_json::to_string(&row)?)?;
        Ok(())
    }

    pub fn log_hedge(&mut self, hedge: &HedgeTrade) -> MakerResult<()> {
        let row = HedgeRow {
            ts: hedge.ts,
            kind: hedge.kind,
            instrument: hedge.instrument.to_string(),
            qty: hedge.qty,
            price: hedge.price,
            spot: hedge.spot,
        };
        writeln!(self.hedges, "{}", serde_json::to_string(&row)?)?;
        Ok(())
    }

    /// Flush all three streams
    pub fn flush(&mut self) -> MakerResult<()> {
        self.quotes.flush()?;
        self.fills.flush()?;
        self.hedges.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InstrumentId;
    use chrono::NaiveDate;

    #[test]
    fn test_rows_append_as_json_lines() {
        let dir = std::env::temp_dir().join(format!(
            "lattice_maker_log_test_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);

        let expiry = NaiveDate::from_ymd_opt(2026, 11, 20).unwrap();
        {
            let mut log = EventLog::open(&dir).unwrap();
            log.log_quote(&Quote {
                expiry,
                strike: 100.0,
                option_type: OptionType::Call,
                fair_value: 5.0,
                fair_value_adjusted: 4.98,
                bid: 4.9,
                ask: 5.06,
                iv: 0.21,
            })
            .unwrap();
            log.log_hedge(&HedgeTrade {
                ts: Utc::now(),
                kind: HedgeKind::Delta,
                instrument: InstrumentId::Underlying,
                qty: -120.0,
                price: 100.0,
                spot: 100.0,
            })
            .unwrap();
            log.flush().unwrap();
        }

        let quotes = fs::read_to_string(dir.join("quotes.jsonl")).unwrap();
        assert_eq!(quotes.lines().count(), 1);
        let parsed: serde_json::Value = serde_json::from_str(quotes.lines().next().unwrap()).unwrap();
        assert_eq!(parsed["strike"], 100.0);
        assert_eq!(parsed["bid"], 4.9);

        let hedges = fs::read_to_string(dir.join("hedges.jsonl")).unwrap();
        assert!(hedges.contains("\"UND\""));

        fs::remove_dir_all(&dir).ok();
    }
}
