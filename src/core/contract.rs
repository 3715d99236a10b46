//! Option contract definitions
//!
//! Vanilla call/put contracts with American or European exercise, and the
//! instrument identity used to key book positions.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::error::MakerError;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }

    /// Single-letter code used in instrument identities ("C"/"P")
    pub fn code(&self) -> &'static str {
        match self {
            OptionType::Call => "C",
            OptionType::Put => "P",
        }
    }
}

/// Exercise style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseStyle {
    European,
    American,
}

/// Strikes are keyed in exact milli-units so instrument identities are
/// hashable and ordered without floating-point comparisons.
const STRIKE_SCALE: f64 = 1000.0;

fn strike_to_key(strike: f64) -> i64 {
    (strike * STRIKE_SCALE).round() as i64
}

fn key_to_strike(key: i64) -> f64 {
    key as f64 / STRIKE_SCALE
}

/// Identity of a tradable instrument in the book: the underlying itself, or
/// one option leg. Serialized as a string ("UND" or "2026-09-18|450|C") so it
/// can key JSON maps; the same form appears in persisted ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstrumentId {
    Underlying,
    OptionLeg {
        expiry: NaiveDate,
        strike_key: i64,
        option_type: OptionType,
    },
}

impl InstrumentId {
    pub fn option(expiry: NaiveDate, strike: f64, option_type: OptionType) -> Self {
        Self::OptionLeg {
            expiry,
            strike_key: strike_to_key(strike),
            option_type,
        }
    }

    pub fn is_underlying(&self) -> bool {
        matches!(self, Self::Underlying)
    }

    /// Strike price for option legs
    pub fn strike(&self) -> Option<f64> {
        match self {
            Self::Underlying => None,
            Self::OptionLeg { strike_key, .. } => Some(key_to_strike(*strike_key)),
        }
    }

    /// Expiry date for option legs
    pub fn expiry(&self) -> Option<NaiveDate> {
        match self {
            Self::Underlying => None,
            Self::OptionLeg { expiry, .. } => Some(*expiry),
        }
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underlying => write!(f, "UND"),
            Self::OptionLeg {
                expiry,
                strike_key,
                option_type,
            } => {
                let strike = key_to_strike(*strike_key);
                if (strike - strike.round()).abs() < f64::EPSILON {
                    write!(f, "{}|{}|{}", expiry, strike as i64, option_type.code())
                } else {
                    write!(f, "{}|{}|{}", expiry, strike, option_type.code())
                }
            }
        }
    }
}

impl FromStr for InstrumentId {
    type Err = MakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "UND" {
            return Ok(Self::Underlying);
        }
        let mut parts = s.split('|');
        let (expiry, strike, code) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(e), Some(k), Some(c), None) => (e, k, c),
            _ => return Err(MakerError::data(format!("bad instrument id: {s}"))),
        };
        let expiry = NaiveDate::from_str(expiry)
            .map_err(|e| MakerError::data(format!("bad expiry in instrument id {s}: {e}")))?;
        let strike: f64 = strike
            .parse()
            .map_err(|e| MakerError::data(format!("bad strike in instrument id {s}: {e}")))?;
        let option_type = match code {
            "C" => OptionType::Call,
            "P" => OptionType::Put,
            other => {
                return Err(MakerError::data(format!(
                    "bad option code {other:?} in instrument id {s}"
                )))
            }
        };
        Ok(Self::option(expiry, strike, option_type))
    }
}

impl Serialize for InstrumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for InstrumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic() {
        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
        assert_eq!(OptionType::Put.intrinsic(110.0, 100.0), 0.0);
    }

    #[test]
    fn test_instrument_id_round_trip() {
        let expiry = NaiveDate::from_ymd_opt(2026, 9, 18).unwrap();
        let id = InstrumentId::option(expiry, 450.5, OptionType::Put);

        let s = id.to_string();
        assert_eq!(s, "2026-09-18|450.5|P");
        assert_eq!(s.parse::<InstrumentId>().unwrap(), id);

        let und = InstrumentId::Underlying;
        assert_eq!(und.to_string().parse::<InstrumentId>().unwrap(), und);
    }

    #[test]
    fn test_instrument_id_integer_strike() {
        let expiry = NaiveDate::from_ymd_opt(2026, 9, 18).unwrap();
        let id = InstrumentId::option(expiry, 100.0, OptionType::Call);
        assert_eq!(id.to_string(), "2026-09-18|100|C");
        assert_eq!(id.strike(), Some(100.0));
    }

    #[test]
    fn test_instrument_ordering_is_stable() {
        let expiry = NaiveDate::from_ymd_opt(2026, 9, 18).unwrap();
        let a = InstrumentId::option(expiry, 95.0, OptionType::Call);
        let b = InstrumentId::option(expiry, 100.0, OptionType::Call);
        assert!(InstrumentId::Underlying < a);
        assert!(a < b);
    }
}
