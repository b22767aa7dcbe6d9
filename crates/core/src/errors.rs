//! # Core Error Types
//!
//! Errors raised by the numerical engine. All failures are local and
//! synchronous: an operation either completes fully or leaves state
//! unchanged, and nothing is retried internally.

use thiserror::Error;

/// Engine errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Math overflow")]
    MathOverflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid logarithm input")]
    InvalidLogarithmInput,

    #[error("Negative square root input")]
    NegativeSqrtInput,

    #[error("Conversion error")]
    ConversionError,

    // ========================================================================
    // Statistics Errors
    // ========================================================================

    #[error("Return series at capacity ({0} observations)")]
    SeriesCapacityExceeded(usize),

    #[error("Insufficient samples: have {actual}, need {required}")]
    InsufficientSamples { actual: u32, required: u32 },

    #[error("Return index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    // ========================================================================
    // Fee Engine Errors
    // ========================================================================

    #[error("Unknown pool {0}")]
    UnknownPool(u64),

    #[error("Unknown or already consumed trade context {0}")]
    UnknownTradeContext(u64),

    #[error("Invalid fee policy: {0}")]
    InvalidFeePolicy(&'static str),
}

/// Result type using engine errors
pub type CoreResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InsufficientSamples {
            actual: 1,
            required: 2,
        };
        assert_eq!(format!("{}", err), "Insufficient samples: have 1, need 2");

        let err = EngineError::UnknownTradeContext(7);
        assert_eq!(
            format!("{}", err),
            "Unknown or already consumed trade context 7"
        );
    }
}
