//! # Transcendental Approximations
//!
//! Natural logarithm, exponential, hyperbolic cosine, and square root in
//! signed Q64.64, built entirely on the fixed-point primitives. The
//! logarithm uses power-of-two range reduction into [0.5, 1.5] followed
//! by a truncated alternating series (`LN_SERIES_TERMS` terms); the
//! exponential reduces by multiples of ln(2) and evaluates a Taylor
//! remainder. Term counts are fixed constants of the implementation.

use crate::constants::{
    EXP_SERIES_TERMS, HALF_Q64, LN2_Q64, LN_SERIES_TERMS, ONE_Q64,
    SQRT_MAX_ITERATIONS,
};
use crate::errors::{CoreResult, EngineError};
use crate::math::fixed_point::{add_q64, div_q64, mul_q64, neg_q64, sub_q64};
use crate::math::safe_math::{safe_mul_i128, safe_sub_i128};

/// Square root of a Q64.64 number via Newton's method
///
/// Iterates `x_{n+1} = (x_n + v/x_n) / 2` from a bit-length seed until
/// the step is at most one unit in the last place or the iteration
/// budget runs out.
pub fn sqrt_q64(value: i128) -> CoreResult<i128> {
    if value < 0 {
        return Err(EngineError::NegativeSqrtInput);
    }
    if value == 0 {
        return Ok(0);
    }

    // The result of sqrt(v * 2^64) has about (bits(v) + 64) / 2 bits
    let bits = 128 - value.leading_zeros();
    let mut guess = 1i128 << ((bits + 64) / 2).min(126);

    for _ in 0..SQRT_MAX_ITERATIONS {
        let next = (add_q64(guess, div_q64(value, guess)?)?) / 2;
        let step = safe_sub_i128(next, guess)?;
        guess = next;
        if step.abs() <= 1 {
            break;
        }
    }

    Ok(guess)
}

/// Natural logarithm of a Q64.64 number
///
/// Fails for non-positive input. Accurate to the truncated series: the
/// worst-case error at the edge of the reduction interval is on the
/// order of 2e-3; inputs near 1 are far more accurate.
pub fn ln_q64(value: i128) -> CoreResult<i128> {
    if value <= 0 {
        return Err(EngineError::InvalidLogarithmInput);
    }

    // Normalize into [0.5, 1.5] by halving/doubling, tracking the net
    // power of two applied
    let mut normalized = value;
    let mut k = 0i32;
    while normalized > ONE_Q64 + HALF_Q64 {
        normalized /= 2;
        k += 1;
    }
    while normalized < HALF_Q64 {
        normalized *= 2;
        k -= 1;
    }

    // ln(1 + z) = z - z^2/2 + z^3/3 - ... for z in [-0.5, 0.5]
    let z = safe_sub_i128(normalized, ONE_Q64)?;
    let mut power = z;
    let mut series = z;
    for n in 2..=LN_SERIES_TERMS {
        power = mul_q64(power, z)?;
        let term = power / (n as i128);
        series = if n % 2 == 0 {
            sub_q64(series, term)?
        } else {
            add_q64(series, term)?
        };
    }

    // ln(x) = ln(2^k * x') = k*ln(2) + ln(x')
    let k_ln2 = safe_mul_i128(k as i128, LN2_Q64)?;
    add_q64(series, k_ln2)
}

/// Exponential of a Q64.64 number
///
/// Reduces the argument by multiples of ln(2), evaluates the Taylor
/// series on the remainder, and shifts by the extracted power of two.
/// Overflows for arguments above about 43; large negative arguments
/// truncate to zero.
pub fn exp_q64(value: i128) -> CoreResult<i128> {
    if value == 0 {
        return Ok(ONE_Q64);
    }

    // e^x = 2^n * e^r with r = x - n*ln(2), |r| < ln(2)
    let n = value / LN2_Q64;
    let remainder = safe_sub_i128(value, safe_mul_i128(n, LN2_Q64)?)?;

    // e^r = 1 + r + r^2/2! + r^3/3! + ...
    let mut term = remainder;
    let mut sum = add_q64(ONE_Q64, remainder)?;
    for i in 2..=EXP_SERIES_TERMS {
        term = mul_q64(term, remainder)? / (i as i128);
        sum = add_q64(sum, term)?;
    }

    if n >= 0 {
        let shift = u32::try_from(n).map_err(|_| EngineError::MathOverflow)?;
        if shift >= sum.leading_zeros() {
            return Err(EngineError::MathOverflow);
        }
        Ok(sum << shift)
    } else {
        let shift = (-n).min(127) as u32;
        Ok(sum >> shift)
    }
}

/// Hyperbolic cosine: (e^x + e^-x) / 2
pub fn cosh_q64(value: i128) -> CoreResult<i128> {
    let positive = exp_q64(value)?;
    let negative = exp_q64(neg_q64(value)?)?;
    Ok(add_q64(positive, negative)? / 2)
}
