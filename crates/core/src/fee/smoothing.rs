//! # Cost-Signal Smoothing
//!
//! Smoothers for the per-trade transaction-cost signal: an integer EMA
//! parameterized by a scaled alpha, and a count-weighted arithmetic
//! running mean. Both seed themselves on their first sample.

use crate::constants::{DEFAULT_EMA_ALPHA, DEFAULT_EMA_PRECISION};

/// Exponential moving average of the transaction-cost signal
///
/// `level = (signal * alpha + level * (precision - alpha)) / precision`
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct GasCostEma {
    level: u64,
    alpha: u64,
    precision: u64,
    initialized: bool,
}

impl GasCostEma {
    /// Create an EMA with the given smoothing parameters
    ///
    /// alpha is clamped into [0, precision]; a zero precision is raised
    /// to one so the update divisor is never zero.
    pub fn new(alpha: u64, precision: u64) -> Self {
        let precision = precision.max(1);
        Self {
            level: 0,
            alpha: alpha.min(precision),
            precision,
            initialized: false,
        }
    }

    /// Fold one cost-signal sample into the average
    ///
    /// The first sample seeds the level directly.
    pub fn update(&mut self, signal: u64) -> u64 {
        if !self.initialized {
            self.level = signal;
            self.initialized = true;
            return self.level;
        }

        // Intermediates stay below 2^128: both factors fit in 64 bits
        let weighted_new = signal as u128 * self.alpha as u128;
        let weighted_old = self.level as u128 * (self.precision - self.alpha) as u128;
        self.level = ((weighted_new + weighted_old) / self.precision as u128) as u64;
        self.level
    }

    /// Current smoothed level, None before the first sample
    pub fn level(&self) -> Option<u64> {
        if self.initialized {
            Some(self.level)
        } else {
            None
        }
    }
}

impl Default for GasCostEma {
    fn default() -> Self {
        Self::new(DEFAULT_EMA_ALPHA, DEFAULT_EMA_PRECISION)
    }
}

/// Count-weighted arithmetic running mean
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct ArithmeticAverage {
    level: u64,
    count: u64,
}

impl ArithmeticAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the running mean
    pub fn update(&mut self, sample: u64) -> u64 {
        if self.count == 0 {
            self.level = sample;
            self.count = 1;
            return self.level;
        }

        let total = self.level as u128 * self.count as u128 + sample as u128;
        self.count += 1;
        self.level = (total / self.count as u128) as u64;
        self.level
    }

    /// Current running mean, zero before the first sample
    pub fn level(&self) -> u64 {
        self.level
    }

    /// Number of samples folded in
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeds_on_first_sample() {
        let mut ema = GasCostEma::new(200, 1000);
        assert_eq!(ema.level(), None);
        assert_eq!(ema.update(50), 50);
        assert_eq!(ema.level(), Some(50));
    }

    #[test]
    fn test_ema_smoothing() {
        let mut ema = GasCostEma::new(200, 1000); // alpha = 0.2
        ema.update(100);
        // 200*0.2 + 100*0.8 = 120
        assert_eq!(ema.update(200), 120);
        // 100*0.2 + 120*0.8 = 116
        assert_eq!(ema.update(100), 116);
    }

    #[test]
    fn test_ema_parameter_clamping() {
        let mut ema = GasCostEma::new(5000, 1000); // alpha clamped to precision
        ema.update(100);
        // Full-weight alpha tracks the signal exactly
        assert_eq!(ema.update(700), 700);

        // Zero precision raised to one rather than dividing by zero
        let mut degenerate = GasCostEma::new(0, 0);
        degenerate.update(10);
        assert_eq!(degenerate.update(99), 10); // alpha 0: level never moves
    }

    #[test]
    fn test_arithmetic_average_sequence() {
        // Seeded at 10, then fed 10, 4, 12: expect 10, 10, 8, 9
        let mut avg = ArithmeticAverage::new();
        assert_eq!(avg.update(10), 10);
        assert_eq!(avg.update(10), 10);
        assert_eq!(avg.update(4), 8);
        assert_eq!(avg.update(12), 9);
        assert_eq!(avg.count(), 4);
    }
}
