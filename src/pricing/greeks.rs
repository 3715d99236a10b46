//! Finite-difference Greek estimator
//!
//! Delta and vega come from bumping the lattice, not from closed forms, so
//! the estimates stay consistent with whatever exercise style the pricer
//! handles. Bump sizes are the named constants in [`GreekBumps`].

use crate::core::{ExerciseStyle, GreekBumps, MakerResult, OptionType};

use super::lattice;

/// Point sensitivities for one contract
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointGreeks {
    /// dV/dS per option unit
    pub delta: f64,
    /// dV/dsigma per 1.00 absolute vol
    pub vega: f64,
}

/// Delta by central difference on spot: (V(S+h) - V(S-h)) / 2h with
/// h = `bumps.spot_rel` * S.
#[allow(clippy::too_many_arguments)]
pub fn delta(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    time: f64,
    steps: usize,
    option_type: OptionType,
    exercise: ExerciseStyle,
    bumps: &GreekBumps,
) -> MakerResult<f64> {
    if time <= 0.0 {
        return Ok(terminal_delta(spot, strike, option_type));
    }
    let h = (bumps.spot_rel * spot).max(1e-6);
    let up = lattice::price(
        spot + h,
        strike,
        rate,
        dividend,
        vol,
        time,
        steps,
        option_type,
        exercise,
    )?;
    let dn = lattice::price(
        spot - h,
        strike,
        rate,
        dividend,
        vol,
        time,
        steps,
        option_type,
        exercise,
    )?;
    Ok((up - dn) / (2.0 * h))
}

/// Vega by central difference on vol: (V(sigma+k) - V(sigma-k)) / 2k with
/// k = `bumps.vol_abs`. Falls back to a one-sided forward difference when the
/// down-bump would leave the valid vol domain.
#[allow(clippy::too_many_arguments)]
pub fn vega(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    time: f64,
    steps: usize,
    option_type: OptionType,
    exercise: ExerciseStyle,
    bumps: &GreekBumps,
) -> MakerResult<f64> {
    if time <= 0.0 {
        return Ok(0.0);
    }
    let k = bumps.vol_abs;
    let up = lattice::price(
        spot,
        strike,
        rate,
        dividend,
        vol + k,
        time,
        steps,
        option_type,
        exercise,
    )?;
    if vol - k > lattice::vol_floor(rate, dividend, time, steps) {
        let dn = lattice::price(
            spot,
            strike,
            rate,
            dividend,
            vol - k,
            time,
            steps,
            option_type,
            exercise,
        )?;
        Ok((up - dn) / (2.0 * k))
    } else {
        let base = lattice::price(
            spot, strike, rate, dividend, vol, time, steps, option_type, exercise,
        )?;
        Ok((up - base) / k)
    }
}

/// Both sensitivities for one contract
#[allow(clippy::too_many_arguments)]
pub fn greeks(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    time: f64,
    steps: usize,
    option_type: OptionType,
    exercise: ExerciseStyle,
    bumps: &GreekBumps,
) -> MakerResult<PointGreeks> {
    Ok(PointGreeks {
        delta: delta(
            spot, strike, rate, dividend, vol, time, steps, option_type, exercise, bumps,
        )?,
        vega: vega(
            spot, strike, rate, dividend, vol, time, steps, option_type, exercise, bumps,
        )?,
    })
}

fn terminal_delta(spot: f64, strike: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => {
            if spot > strike {
                1.0
            } else {
                0.0
            }
        }
        OptionType::Put => {
            if spot < strike {
                -1.0
            } else {
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 200;

    fn bumps() -> GreekBumps {
        GreekBumps::default()
    }

    #[test]
    fn test_call_delta_range() {
        let d = delta(
            100.0,
            100.0,
            0.01,
            0.0,
            0.2,
            0.5,
            N,
            OptionType::Call,
            ExerciseStyle::American,
            &bumps(),
        )
        .unwrap();
        assert!(d > 0.4 && d < 0.7, "ATM call delta off: {d}");
    }

    #[test]
    fn test_put_delta_negative() {
        let d = delta(
            100.0,
            100.0,
            0.01,
            0.0,
            0.2,
            0.5,
            N,
            OptionType::Put,
            ExerciseStyle::American,
            &bumps(),
        )
        .unwrap();
        assert!(d < -0.3 && d > -0.7, "ATM put delta off: {d}");
    }

    #[test]
    fn test_deep_itm_call_delta_near_one() {
        let d = delta(
            150.0,
            100.0,
            0.01,
            0.0,
            0.2,
            0.25,
            N,
            OptionType::Call,
            ExerciseStyle::American,
            &bumps(),
        )
        .unwrap();
        assert!(d > 0.95, "deep ITM delta off: {d}");
    }

    #[test]
    fn test_vega_positive() {
        let v = vega(
            100.0,
            100.0,
            0.01,
            0.0,
            0.2,
            0.5,
            N,
            OptionType::Call,
            ExerciseStyle::American,
            &bumps(),
        )
        .unwrap();
        // ATM vega per 1.00 vol roughly 0.4 * S * sqrt(T)
        assert!(v > 20.0 && v < 35.0, "ATM vega off: {v}");
    }

    #[test]
    fn test_vega_one_sided_at_domain_edge() {
        let tiny = GreekBumps {
            spot_rel: 1e-2,
            vol_abs: 0.05,
        };
        // vol - k would be negative; the forward difference still works
        let v = vega(
            100.0,
            100.0,
            0.01,
            0.0,
            0.03,
            0.5,
            N,
            OptionType::Call,
            ExerciseStyle::American,
            &tiny,
        )
        .unwrap();
        assert!(v > 0.0);
    }

    #[test]
    fn test_expired_greeks() {
        let d = delta(
            110.0,
            100.0,
            0.01,
            0.0,
            0.2,
            0.0,
            N,
            OptionType::Call,
            ExerciseStyle::American,
            &bumps(),
        )
        .unwrap();
        assert_eq!(d, 1.0);
        let v = vega(
            110.0,
            100.0,
            0.01,
            0.0,
            0.2,
            0.0,
            N,
            OptionType::Call,
            ExerciseStyle::American,
            &bumps(),
        )
        .unwrap();
        assert_eq!(v, 0.0);
    }
}
