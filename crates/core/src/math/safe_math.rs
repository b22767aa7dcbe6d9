//! # Safe Math Operations
//!
//! Overflow-checked arithmetic used by the fixed-point layer. In the
//! signed Q64.64 domain both ends of the representable range are a
//! single out-of-range condition, so checked_add/checked_sub failures
//! map to `MathOverflow` in either direction.

use crate::errors::{CoreResult, EngineError};

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Division operations with zero check
    (div, $fn_name:ident, $type:ty) => {
        /// Safe division with zero check
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            if b == 0 {
                return Err(EngineError::DivisionByZero);
            }
            a.checked_div(b).ok_or(EngineError::MathOverflow)
        }
    };

    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident) => {
        /// Safe arithmetic with range check
        pub fn $fn_name(a: $type, b: $type) -> CoreResult<$type> {
            a.$checked_method(b).ok_or(EngineError::MathOverflow)
        }
    };

    // Simple cast with max check
    (cast_max, $fn_name:ident, $from_type:ty, $to_type:ty, $max_val:expr) => {
        /// Safe narrowing cast
        pub fn $fn_name(value: $from_type) -> CoreResult<$to_type> {
            if value > $max_val {
                return Err(EngineError::ConversionError);
            }
            Ok(value as $to_type)
        }
    };
}

// Generate basic arithmetic functions
safe_arith!(safe_add_i128, i128, checked_add);
safe_arith!(safe_sub_i128, i128, checked_sub);
safe_arith!(safe_mul_i128, i128, checked_mul);
safe_arith!(div, safe_div_i128, i128);

safe_arith!(safe_add_u128, u128, checked_add);
safe_arith!(safe_sub_u128, u128, checked_sub);
safe_arith!(safe_mul_u128, u128, checked_mul);
safe_arith!(div, safe_div_u128, u128);

safe_arith!(safe_add_u64, u64, checked_add);
safe_arith!(safe_sub_u64, u64, checked_sub);
safe_arith!(safe_mul_u64, u64, checked_mul);
safe_arith!(div, safe_div_u64, u64);

// Generate type conversion functions
safe_arith!(cast_max, safe_cast_u128_to_i128, u128, i128, i128::MAX as u128);
safe_arith!(cast_max, safe_cast_u128_to_u64, u128, u64, u64::MAX as u128);

/// Checked negation (i128::MIN has no positive counterpart)
pub fn safe_neg_i128(value: i128) -> CoreResult<i128> {
    value.checked_neg().ok_or(EngineError::MathOverflow)
}

/// Checked absolute value as unsigned magnitude
pub fn abs_u128(value: i128) -> u128 {
    value.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add_sub() {
        assert_eq!(safe_add_i128(2, 3).unwrap(), 5);
        assert_eq!(safe_sub_i128(2, 3).unwrap(), -1);
        assert_eq!(
            safe_add_i128(i128::MAX, 1),
            Err(EngineError::MathOverflow)
        );
        assert_eq!(
            safe_sub_i128(i128::MIN, 1),
            Err(EngineError::MathOverflow)
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(safe_div_i128(1, 0), Err(EngineError::DivisionByZero));
        assert_eq!(safe_div_u128(1, 0), Err(EngineError::DivisionByZero));
        assert_eq!(safe_div_i128(-7, 2).unwrap(), -3);
    }

    #[test]
    fn test_division_overflow() {
        // i128::MIN / -1 overflows
        assert_eq!(
            safe_div_i128(i128::MIN, -1),
            Err(EngineError::MathOverflow)
        );
    }

    #[test]
    fn test_negation() {
        assert_eq!(safe_neg_i128(5).unwrap(), -5);
        assert_eq!(safe_neg_i128(i128::MIN), Err(EngineError::MathOverflow));
        assert_eq!(abs_u128(i128::MIN), 1u128 << 127);
    }

    #[test]
    fn test_casts() {
        assert_eq!(safe_cast_u128_to_i128(42).unwrap(), 42i128);
        assert_eq!(
            safe_cast_u128_to_i128(u128::MAX),
            Err(EngineError::ConversionError)
        );
        assert_eq!(safe_cast_u128_to_u64(42).unwrap(), 42u64);
    }
}
