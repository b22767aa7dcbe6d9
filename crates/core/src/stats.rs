//! # Online Return Statistics
//!
//! Incremental mean/variance over logarithmic returns using Welford's
//! single-pass algorithm, expressed in the Q64.64 primitives. The update
//! order (delta, mean, delta2, m2) is load-bearing: it is what keeps the
//! accumulation numerically stable under fixed-point rounding, and it
//! must not be replaced with a two-pass formula.

use crate::constants::MAX_SERIES_OBSERVATIONS;
use crate::errors::{CoreResult, EngineError};
use crate::math::fixed_point::{add_q64, div_q64, from_int, mul_q64, sub_q64};
use crate::math::transcendental::ln_q64;

/// Bounded series of prices and derived log-returns with running
/// mean and squared-deviation sum
#[derive(Debug, Clone)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturnSeries {
    /// Number of accumulated returns
    count: u32,
    /// Running mean of returns (Q64.64)
    mean: i128,
    /// Accumulated squared-deviation sum, always >= 0 (Q64.64)
    m2: i128,
    /// Raw price observations (Q64.64)
    prices: Vec<i128>,
    /// Derived or directly fed log-returns (Q64.64)
    returns: Vec<i128>,
    /// Storage bound for each sequence
    capacity: usize,
}

impl ReturnSeries {
    /// Create an empty series with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(MAX_SERIES_OBSERVATIONS)
    }

    /// Create an empty series with an explicit capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            count: 0,
            mean: 0,
            m2: 0,
            prices: Vec::new(),
            returns: Vec::new(),
            capacity,
        }
    }

    /// Append one return and fold it into the running statistics
    ///
    /// Welford's update, in this exact order:
    /// `delta = r - mean; mean += delta/n; delta2 = r - mean;
    /// m2 += delta * delta2`. All intermediates are computed before any
    /// field is written, so a failing operation leaves the series
    /// unchanged.
    pub fn add_return(&mut self, value: i128) -> CoreResult<()> {
        if self.returns.len() >= self.capacity {
            return Err(EngineError::SeriesCapacityExceeded(self.capacity));
        }

        let n = self.count + 1;
        let (new_mean, new_m2) = if n == 1 {
            (value, 0)
        } else {
            let delta = sub_q64(value, self.mean)?;
            let new_mean = add_q64(self.mean, div_q64(delta, from_int(n as i64))?)?;
            let delta2 = sub_q64(value, new_mean)?;
            let new_m2 = add_q64(self.m2, mul_q64(delta, delta2)?)?;
            (new_mean, new_m2)
        };

        self.returns.push(value);
        self.count = n;
        self.mean = new_mean;
        self.m2 = new_m2;
        Ok(())
    }

    /// Append one price, deriving a log-return against the previous one
    ///
    /// The first price produces no return. A non-positive price ratio
    /// surfaces as a logarithm domain error before anything is stored.
    pub fn add_price(&mut self, price: i128) -> CoreResult<()> {
        if self.prices.len() >= self.capacity {
            return Err(EngineError::SeriesCapacityExceeded(self.capacity));
        }

        let log_return = match self.prices.last() {
            Some(&previous) => Some(ln_q64(div_q64(price, previous)?)?),
            None => None,
        };

        if let Some(log_return) = log_return {
            self.add_return(log_return)?;
        }
        self.prices.push(price);
        Ok(())
    }

    /// Sample variance: m2 / (count - 1)
    pub fn variance(&self) -> CoreResult<i128> {
        if self.count < 2 {
            return Err(EngineError::InsufficientSamples {
                actual: self.count,
                required: 2,
            });
        }
        div_q64(self.m2, from_int((self.count - 1) as i64))
    }

    /// Running mean of the accumulated returns
    pub fn mean(&self) -> i128 {
        self.mean
    }

    /// Accumulated squared-deviation sum
    pub fn m2(&self) -> i128 {
        self.m2
    }

    /// Number of accumulated returns
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Return by index
    pub fn return_at(&self, index: usize) -> CoreResult<i128> {
        self.returns
            .get(index)
            .copied()
            .ok_or(EngineError::IndexOutOfBounds {
                index,
                len: self.returns.len(),
            })
    }

    /// The full return sequence
    pub fn returns(&self) -> &[i128] {
        &self.returns
    }

    /// Most recently observed price, if any
    pub fn last_price(&self) -> Option<i128> {
        self.prices.last().copied()
    }
}

impl Default for ReturnSeries {
    fn default() -> Self {
        Self::new()
    }
}
