//! # Fixed-Point Arithmetic
//!
//! Signed Q64.64 operations over raw `i128` values: 64 integer bits,
//! 64 fractional bits. Multiplication and division widen into the
//! 256-bit domain before rescaling, and fail rather than wrap when the
//! mathematical result leaves the representable range. Every module
//! above this one uses these primitives only, with no ad hoc scaling.

use crate::constants::Q64;
use crate::errors::{CoreResult, EngineError};
use crate::math::big_int::{mul_u128_to_u256, U256};
use crate::math::safe_math::{
    abs_u128, safe_add_i128, safe_cast_u128_to_i128, safe_neg_i128, safe_sub_i128,
};

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert an integer to Q64.64
pub fn from_int(value: i64) -> i128 {
    (value as i128) << 64
}

/// Convert Q64.64 to an integer, truncating toward zero
pub fn to_int(value: i128) -> i64 {
    (value / Q64) as i64
}

/// Convert f64 to Q64.64 (boundary conversions only; engine arithmetic
/// never passes through floating point)
pub fn from_f64(value: f64) -> CoreResult<i128> {
    if !value.is_finite() || value.abs() >= (i64::MAX as f64) {
        return Err(EngineError::ConversionError);
    }
    Ok((value * (Q64 as f64)) as i128)
}

/// Convert Q64.64 to f64
pub fn to_f64(value: i128) -> f64 {
    (value as f64) / (Q64 as f64)
}

// ============================================================================
// Arithmetic Operations
// ============================================================================

/// Add two Q64.64 numbers
pub fn add_q64(a: i128, b: i128) -> CoreResult<i128> {
    safe_add_i128(a, b)
}

/// Subtract two Q64.64 numbers
pub fn sub_q64(a: i128, b: i128) -> CoreResult<i128> {
    safe_sub_i128(a, b)
}

/// Negate a Q64.64 number
pub fn neg_q64(value: i128) -> CoreResult<i128> {
    safe_neg_i128(value)
}

/// Absolute value of a Q64.64 number
pub fn abs_q64(value: i128) -> CoreResult<i128> {
    if value >= 0 {
        Ok(value)
    } else {
        safe_neg_i128(value)
    }
}

/// Multiply two Q64.64 numbers, truncating toward zero
pub fn mul_q64(a: i128, b: i128) -> CoreResult<i128> {
    let negative = (a < 0) != (b < 0);

    // Widen the magnitudes to 256 bits, then scale back down by 2^64
    let product = mul_u128_to_u256(abs_u128(a), abs_u128(b));
    let magnitude = product
        .shr(64)
        .to_u128()
        .ok_or(EngineError::MathOverflow)?;

    apply_sign(magnitude, negative)
}

/// Divide two Q64.64 numbers, truncating toward zero
pub fn div_q64(a: i128, b: i128) -> CoreResult<i128> {
    if b == 0 {
        return Err(EngineError::DivisionByZero);
    }

    let negative = (a < 0) != (b < 0);

    // Scale the dividend up by 2^64 in the 256-bit domain before dividing
    let numerator = U256::from_u128(abs_u128(a))
        .shl(64)
        .ok_or(EngineError::MathOverflow)?;
    let magnitude = numerator
        .div(&U256::from_u128(abs_u128(b)))
        .ok_or(EngineError::DivisionByZero)?
        .to_u128()
        .ok_or(EngineError::MathOverflow)?;

    apply_sign(magnitude, negative)
}

/// Reattach a sign to an unsigned magnitude, checking the i128 range
fn apply_sign(magnitude: u128, negative: bool) -> CoreResult<i128> {
    let value = safe_cast_u128_to_i128(magnitude)
        .map_err(|_| EngineError::MathOverflow)?;
    if negative {
        safe_neg_i128(value)
    } else {
        Ok(value)
    }
}
