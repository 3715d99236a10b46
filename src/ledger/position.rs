//! Book positions
//!
//! One signed position per instrument, carried at average cost. Positions
//! are only ever zeroed, never removed, so the book retains every instrument
//! it has traded.

use serde::{Deserialize, Serialize};

/// Signed inventory in one instrument at average cost.
///
/// Quantity units: option contracts for option legs, shares for the
/// underlying. Average cost is per option unit / per share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Signed quantity: positive long, negative short
    pub qty: f64,
    /// Average entry price of the open side
    pub avg_cost: f64,
}

/// Quantities this close to zero are treated as flat
const FLAT_EPS: f64 = 1e-9;

impl Position {
    pub fn is_flat(&self) -> bool {
        self.qty.abs() < FLAT_EPS
    }

    /// Apply a signed trade at `price`, returning realized PnL per payoff
    /// unit (caller scales by the contract multiplier).
    ///
    /// Average-cost rules:
    /// - opening or adding to the same side re-averages the cost basis and
    ///   realizes nothing;
    /// - reducing realizes (price - avg) * closed * sign on the closed
    ///   portion and leaves the basis untouched;
    /// - flipping through zero realizes the full old side and carries the
    ///   trade price as the new side's basis.
    pub fn apply(&mut self, qty: f64, price: f64) -> f64 {
        if qty == 0.0 {
            return 0.0;
        }
        if self.is_flat() {
            self.qty = qty;
            self.avg_cost = price;
            return 0.0;
        }
        if self.qty.signum() == qty.signum() {
            let total = self.avg_cost * self.qty + price * qty;
            self.qty += qty;
            self.avg_cost = total / self.qty;
            return 0.0;
        }

        let closed = qty.abs().min(self.qty.abs());
        let side = self.qty.signum();
        let realized = (price - self.avg_cost) * closed * side;

        let remaining = self.qty + qty;
        if remaining.abs() < FLAT_EPS {
            self.qty = 0.0;
            self.avg_cost = 0.0;
        } else if remaining.signum() == side {
            // Partial reduce: basis unchanged
            self.qty = remaining;
        } else {
            // Flipped: new side opens at the trade price
            self.qty = remaining;
            self.avg_cost = price;
        }
        realized
    }

    /// Unrealized PnL per payoff unit at the given mark
    pub fn unrealized(&self, mark: f64) -> f64 {
        if self.is_flat() {
            0.0
        } else {
            (mark - self.avg_cost) * self.qty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_add_averages_cost() {
        let mut pos = Position::default();
        assert_eq!(pos.apply(2.0, 10.0), 0.0);
        assert_eq!(pos.apply(2.0, 12.0), 0.0);
        assert_eq!(pos.qty, 4.0);
        assert!((pos.avg_cost - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_reduce_realizes_and_keeps_basis() {
        let mut pos = Position::default();
        pos.apply(4.0, 10.0);
        let realized = pos.apply(-1.0, 14.0);
        assert!((realized - 4.0).abs() < 1e-12);
        assert_eq!(pos.qty, 3.0);
        assert_eq!(pos.avg_cost, 10.0);
    }

    #[test]
    fn test_close_resets() {
        let mut pos = Position::default();
        pos.apply(2.0, 10.0);
        let realized = pos.apply(-2.0, 9.0);
        assert!((realized + 2.0).abs() < 1e-12);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_cost, 0.0);
    }

    #[test]
    fn test_short_cover_profit() {
        let mut pos = Position::default();
        pos.apply(-3.0, 10.0);
        let realized = pos.apply(3.0, 8.0);
        // Short at 10, covered at 8: +2 per unit
        assert!((realized - 6.0).abs() < 1e-12);
        assert!(pos.is_flat());
    }

    #[test]
    fn test_flip_carries_trade_price() {
        let mut pos = Position::default();
        pos.apply(2.0, 10.0);
        let realized = pos.apply(-5.0, 12.0);
        // Realize +2 on 2 closed units, flip short 3 @ 12
        assert!((realized - 4.0).abs() < 1e-12);
        assert_eq!(pos.qty, -3.0);
        assert_eq!(pos.avg_cost, 12.0);
    }

    #[test]
    fn test_unrealized() {
        let mut pos = Position::default();
        pos.apply(2.0, 10.0);
        assert!((pos.unrealized(11.5) - 3.0).abs() < 1e-12);
        pos.apply(-2.0, 11.5);
        assert_eq!(pos.unrealized(20.0), 0.0);
    }
}
