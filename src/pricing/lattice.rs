//! CRR binomial lattice pricer
//!
//! Prices vanilla American and European options on a recombining
//! multiplicative lattice with risk-neutral backward induction. This is the
//! production pricing path; the closed-form Black-Scholes module exists only
//! as a European cross-check.
//!
//! The pricer is a pure function of its inputs. Step count is the caller's
//! quality knob; nothing here auto-tunes it.

use crate::core::{ExerciseStyle, MakerError, MakerResult, OptionType};

/// Price an option on a CRR lattice.
///
/// Calibration per step: u = exp(sigma*sqrt(dt)), d = 1/u,
/// p = (exp((r - q)*dt) - d) / (u - d). A risk-neutral probability outside
/// (0, 1) means the step width is incompatible with the inputs and fails the
/// call rather than silently clamping.
///
/// `time <= 0` returns intrinsic value.
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    time: f64,
    steps: usize,
    option_type: OptionType,
    exercise: ExerciseStyle,
) -> MakerResult<f64> {
    if spot <= 0.0 || strike <= 0.0 {
        return Err(MakerError::invalid_input(format!(
            "non-positive spot {spot} or strike {strike}"
        )));
    }
    if vol <= 0.0 {
        return Err(MakerError::invalid_input(format!("non-positive vol {vol}")));
    }
    if steps == 0 {
        return Err(MakerError::invalid_input("zero lattice steps"));
    }
    if time <= 0.0 {
        return Ok(option_type.intrinsic(spot, strike));
    }

    let dt = time / steps as f64;
    let u = (vol * dt.sqrt()).exp();
    let d = 1.0 / u;
    let p = (((rate - dividend) * dt).exp() - d) / (u - d);

    if !(p > 0.0 && p < 1.0) || !p.is_finite() {
        return Err(MakerError::InvalidLatticeProbability {
            prob: p,
            vol,
            steps,
        });
    }

    let disc = (-rate * dt).exp();
    let n = steps;

    // Terminal payoffs at the n+1 leaf nodes
    let mut values: Vec<f64> = (0..=n)
        .map(|j| {
            let s = spot * u.powi(j as i32) * d.powi((n - j) as i32);
            option_type.intrinsic(s, strike)
        })
        .collect();

    // Discounted expectation level by level; American nodes also compare
    // against immediate exercise at that node's spot.
    for i in (0..n).rev() {
        for j in 0..=i {
            let continuation = disc * (p * values[j + 1] + (1.0 - p) * values[j]);
            values[j] = match exercise {
                ExerciseStyle::European => continuation,
                ExerciseStyle::American => {
                    let s = spot * u.powi(j as i32) * d.powi((i - j) as i32);
                    continuation.max(option_type.intrinsic(s, strike))
                }
            };
        }
    }

    let value = values[0];
    check_bounds(
        value, spot, strike, rate, dividend, vol, time, steps, option_type, exercise,
    )?;
    Ok(value)
}

/// Smallest volatility for which the risk-neutral probability stays inside
/// (0, 1) at this step width: p is valid iff sigma > |r - q| * sqrt(dt).
/// Returned with a safety margin; evaluating the lattice below this floor
/// fails the probability check.
pub fn vol_floor(rate: f64, dividend: f64, time: f64, steps: usize) -> f64 {
    if time <= 0.0 || steps == 0 {
        return 0.0;
    }
    1.5 * (rate - dividend).abs() * (time / steps as f64).sqrt()
}

/// No-arbitrage lower bound for the given contract
pub fn lower_bound(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    time: f64,
    option_type: OptionType,
    exercise: ExerciseStyle,
) -> f64 {
    let fwd_intrinsic = match option_type {
        OptionType::Call => spot * (-dividend * time).exp() - strike * (-rate * time).exp(),
        OptionType::Put => strike * (-rate * time).exp() - spot * (-dividend * time).exp(),
    }
    .max(0.0);
    match exercise {
        // American options can always be exercised now
        ExerciseStyle::American => fwd_intrinsic.max(option_type.intrinsic(spot, strike)),
        ExerciseStyle::European => fwd_intrinsic,
    }
}

/// No-arbitrage upper bound for the given contract
pub fn upper_bound(
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    time: f64,
    option_type: OptionType,
    exercise: ExerciseStyle,
) -> f64 {
    match (option_type, exercise) {
        (OptionType::Call, _) => spot * (-dividend * time).exp(),
        (OptionType::Put, ExerciseStyle::American) => strike,
        (OptionType::Put, ExerciseStyle::European) => strike * (-rate * time).exp(),
    }
}

/// Backstop after induction: a value outside the theoretical bounds means the
/// lattice parameters were degenerate, which maps to the same failure as a
/// bad risk-neutral probability.
#[allow(clippy::too_many_arguments)]
fn check_bounds(
    value: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    time: f64,
    steps: usize,
    option_type: OptionType,
    exercise: ExerciseStyle,
) -> MakerResult<()> {
    let lo = lower_bound(spot, strike, rate, dividend, time, option_type, exercise);
    let hi = upper_bound(spot, strike, rate, dividend, time, option_type, exercise);
    let tol = 1e-8 * (1.0 + spot.max(strike));
    if !value.is_finite() || value < lo - tol || value > hi + tol {
        return Err(MakerError::InvalidLatticeProbability {
            prob: f64::NAN,
            vol,
            steps,
        });
    }
    Ok(())
}
