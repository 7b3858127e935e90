use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::BuyoutError;
use crate::types::{Money, Rate};
use crate::BuyoutResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const RATE_FLOOR: Decimal = dec!(-0.99);
const RATE_CEILING: Decimal = dec!(100.0);
const DEFAULT_GUESS: Decimal = dec!(0.10);

/// Net Present Value of a series of cash flows (index 0 undiscounted)
pub fn npv(rate: Rate, cash_flows: &[Money]) -> BuyoutResult<Money> {
    if rate <= dec!(-1) {
        return Err(BuyoutError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(d) => discount = d,
                // Later terms are discounted past Decimal range and contribute nothing
                None => break,
            }
        }
        if discount.is_zero() {
            return Err(BuyoutError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        let term = cf
            .checked_div(discount)
            .ok_or_else(|| BuyoutError::DivisionByZero {
                context: format!("NPV term overflow at period {t}"),
            })?;
        result = result
            .checked_add(term)
            .ok_or_else(|| BuyoutError::DivisionByZero {
                context: format!("NPV sum overflow at period {t}"),
            })?;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson
pub fn irr(cash_flows: &[Money], guess: Rate) -> BuyoutResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(BuyoutError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let diverged = |last_delta: Decimal| BuyoutError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: i,
            last_delta,
        };
        let mut npv_val = Decimal::ZERO;
        let mut dnpv = Decimal::ZERO;
        let one_plus_r = Decimal::ONE + rate;

        for (t, cf) in cash_flows.iter().enumerate() {
            let Some(discount) = one_plus_r.checked_powi(t as i64) else {
                continue;
            };
            let Some(term) = cf.checked_div(discount) else {
                continue;
            };
            npv_val = npv_val.checked_add(term).ok_or_else(|| diverged(Decimal::MAX))?;
            if t > 0 {
                if let Some(slope) = discount.checked_mul(one_plus_r).and_then(|next| {
                    Decimal::from(t as i64)
                        .checked_mul(*cf)
                        .and_then(|weighted| weighted.checked_div(next))
                }) {
                    dnpv = dnpv.checked_sub(slope).ok_or_else(|| diverged(npv_val))?;
                }
            }
        }

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(diverged(npv_val));
        }

        rate = npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
            .ok_or_else(|| diverged(npv_val))?;

        // Guard against divergence
        if rate < RATE_FLOOR {
            rate = RATE_FLOOR;
        } else if rate > RATE_CEILING {
            rate = RATE_CEILING;
        }
    }

    Err(BuyoutError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv(rate, cash_flows).unwrap_or(Decimal::MAX),
    })
}

/// Lowest rate from `RATE_FLOOR` upward whose NPV is representable.
///
/// Long series push `(1 + r)^t` below Decimal resolution near the floor, so
/// `1 + r` is doubled until the NPV stops overflowing or the rate reaches zero.
fn lower_bracket(cash_flows: &[Money]) -> BuyoutResult<(Rate, Money)> {
    let mut lo = RATE_FLOOR;
    loop {
        match npv(lo, cash_flows) {
            Ok(value) => return Ok((lo, value)),
            Err(e) if lo >= Decimal::ZERO => return Err(e),
            Err(_) => {
                let next = (Decimal::ONE + lo) * dec!(2) - Decimal::ONE;
                lo = next.min(Decimal::ZERO);
            }
        }
    }
}

/// IRR by bisection over `[RATE_FLOOR, RATE_CEILING]`.
///
/// The lower end moves up when the NPV at the floor is not representable.
/// Requires the NPV to change sign across the bracket.
pub fn irr_bisection(cash_flows: &[Money]) -> BuyoutResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(BuyoutError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let (mut lo, mut npv_lo) = lower_bracket(cash_flows)?;
    let mut hi = RATE_CEILING;
    let npv_hi = npv(hi, cash_flows)?;

    if npv_lo.is_sign_positive() == npv_hi.is_sign_positive() {
        return Err(BuyoutError::ConvergenceFailure {
            function: "IRR bisection".into(),
            iterations: 0,
            last_delta: npv_lo,
        });
    }

    for i in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let npv_mid = npv(mid, cash_flows)?;
        if npv_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo) < CONVERGENCE_THRESHOLD {
            tracing::trace!(iterations = i, "IRR bisection converged");
            return Ok(mid);
        }
        if npv_mid.is_sign_positive() == npv_lo.is_sign_positive() {
            lo = mid;
            npv_lo = npv_mid;
        } else {
            hi = mid;
        }
    }

    Err(BuyoutError::ConvergenceFailure {
        function: "IRR bisection".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: npv_lo,
    })
}

/// IRR that degrades to `None` instead of failing.
///
/// Returns `None` when the series has no sign change (no root exists) or when
/// neither Newton-Raphson nor bisection converges.
pub fn solve_irr(cash_flows: &[Money]) -> Option<Rate> {
    let has_outflow = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_inflow = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if cash_flows.len() < 2 || !has_outflow || !has_inflow {
        return None;
    }

    match irr(cash_flows, DEFAULT_GUESS) {
        Ok(rate) if rate > RATE_FLOOR && rate < RATE_CEILING => Some(rate),
        _ => match irr_bisection(cash_flows) {
            Ok(rate) => Some(rate),
            Err(e) => {
                tracing::debug!(error = %e, "IRR did not converge");
                None
            }
        },
    }
}
