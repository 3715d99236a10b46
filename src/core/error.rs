//! Error types for the market-making core

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MakerError {
    /// Risk-neutral probability left (0, 1), or the lattice produced a price
    /// outside its no-arbitrage bounds. Fatal to the single pricing call only.
    #[error("invalid lattice probability p={prob:.6} (vol={vol:.6}, steps={steps})")]
    InvalidLatticeProbability { prob: f64, vol: f64, steps: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A position could not be marked during a risk snapshot. The offending
    /// instrument is named so callers can skip the tick without silently
    /// dropping it from aggregate exposure.
    #[error("position {instrument} could not be marked: {reason}")]
    MarkFailure { instrument: String, reason: String },

    /// No usable ATM instrument in an expiry that needs a vega hedge.
    /// Skip that expiry this tick, retry on the next.
    #[error("no hedge instrument available for expiry {expiry}")]
    HedgeInfeasible { expiry: NaiveDate },

    #[error("data error: {0}")]
    Data(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type MakerResult<T> = Result<T, MakerError>;

impl MakerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn mark_failure(instrument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MarkFailure {
            instrument: instrument.into(),
            reason: reason.into(),
        }
    }
}
