use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EquipFinanceError;
use crate::types::{Money, Rate};
use crate::EquipFinanceResult;

const MAX_RATE_ITERATIONS: u32 = 100;
const RATE_EPSILON: Decimal = dec!(0.0000000001);
const DERIVATIVE_STEP: Decimal = dec!(0.00000001);

/// When within each period the payment falls due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentTiming {
    /// End of period (ordinary annuity).
    #[default]
    Arrears,
    /// Start of period (annuity due). Equipment finance quotes use this.
    Advance,
}

/// Outcome of the Newton-Raphson rate search.
///
/// A non-converged search still carries the best rate it reached so callers
/// can report an advisory figure; `residual` is the absolute pricing error
/// (in currency units) left at that rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RateSolution {
    Converged { rate: Rate, iterations: u32 },
    DidNotConverge { rate: Rate, residual: Decimal },
}

impl RateSolution {
    /// The solved (or best-effort) per-period rate.
    pub fn rate(&self) -> Rate {
        match self {
            RateSolution::Converged { rate, .. } => *rate,
            RateSolution::DidNotConverge { rate, .. } => *rate,
        }
    }

    pub fn converged(&self) -> bool {
        matches!(self, RateSolution::Converged { .. })
    }
}

/// Fixed payment per period that amortises `present_value` down to
/// `future_value` over `nper` periods at per-period `rate`.
///
/// Spreadsheet sign convention: pass the financed amount as a negative
/// present value to get a positive payment back.
pub fn pmt(
    rate: Rate,
    nper: u32,
    present_value: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> EquipFinanceResult<Money> {
    if nper == 0 {
        return Err(EquipFinanceError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r.powd(Decimal::from(nper));
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(EquipFinanceError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    let mut payment = (present_value * factor + future_value) / annuity_factor;
    if timing == PaymentTiming::Advance {
        payment /= one_plus_r;
    }

    Ok(-payment)
}

/// Principal supportable by a given payment stream; the inverse of [`pmt`]
/// under the same sign convention, so a negative payment yields a positive
/// principal.
pub fn pv(
    rate: Rate,
    nper: u32,
    payment: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> EquipFinanceResult<Money> {
    if rate.is_zero() {
        return Ok(-(payment * Decimal::from(nper)) - future_value);
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r.powd(Decimal::from(nper));

    if factor.is_zero() {
        return Err(EquipFinanceError::DivisionByZero {
            context: "PV discount factor".into(),
        });
    }

    let annuity_factor = (Decimal::ONE - Decimal::ONE / factor) / rate;
    let mut value = -(payment * annuity_factor + future_value / factor);
    if timing == PaymentTiming::Advance {
        value *= one_plus_r;
    }

    Ok(value)
}

/// Per-period rate implied by a known payment, via Newton-Raphson iteration
/// on `f(rate) = pv(rate, ...) - target_pv` with a numerical derivative.
///
/// Steps that leave `[0, 1]` reset the rate to the initial guess rather than
/// chasing a runaway iterate. The search never fails hard: exhausting the
/// iteration budget (or hitting a flat derivative) returns
/// [`RateSolution::DidNotConverge`] with the best-effort rate.
pub fn solve_rate(
    nper: u32,
    payment: Money,
    target_pv: Money,
    future_value: Money,
    timing: PaymentTiming,
    guess: Rate,
) -> RateSolution {
    let mut rate = guess;

    for iteration in 0..MAX_RATE_ITERATIONS {
        // Keep the evaluation point away from the zero-rate singularity.
        if rate.abs() < RATE_EPSILON {
            rate = RATE_EPSILON;
        }

        let value = match pv(rate, nper, payment, future_value, timing) {
            Ok(v) => v,
            Err(_) => {
                return RateSolution::DidNotConverge {
                    rate,
                    residual: Decimal::MAX,
                }
            }
        };
        let f = value - target_pv;

        if f.abs() < RATE_EPSILON {
            return RateSolution::Converged {
                rate,
                iterations: iteration,
            };
        }

        let derivative = match pv_slope(rate, nper, payment, future_value, timing) {
            Some(d) if !d.is_zero() => d,
            _ => {
                return RateSolution::DidNotConverge {
                    rate,
                    residual: f.abs(),
                }
            }
        };

        let next = rate - f / derivative;

        if (next - rate).abs() < RATE_EPSILON {
            return RateSolution::Converged {
                rate: next,
                iterations: iteration,
            };
        }

        rate = next;

        if rate < Decimal::ZERO || rate > Decimal::ONE {
            rate = guess;
        }
    }

    let residual = match pv(rate, nper, payment, future_value, timing) {
        Ok(v) => (v - target_pv).abs(),
        Err(_) => Decimal::MAX,
    };

    RateSolution::DidNotConverge { rate, residual }
}

/// Central-difference derivative of [`pv`] with respect to the rate.
fn pv_slope(
    rate: Rate,
    nper: u32,
    payment: Money,
    future_value: Money,
    timing: PaymentTiming,
) -> Option<Decimal> {
    let upper = pv(rate + DERIVATIVE_STEP, nper, payment, future_value, timing).ok()?;
    let lower = pv(rate - DERIVATIVE_STEP, nper, payment, future_value, timing).ok()?;
    Some((upper - lower) / (dec!(2) * DERIVATIVE_STEP))
}
