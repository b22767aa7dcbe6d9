//! # Engine Constants
//!
//! Fundamental constants for the fee-policy engine:
//! - Fixed-point scale factors and precomputed transcendental constants
//! - Series approximation term counts
//! - Return-series capacity
//! - Fee structure and smoothing parameters

// ============================================================================
// Fixed-Point Constants
// ============================================================================

/// Q64.64 scale factor: 2^64
pub const Q64: i128 = 1i128 << 64;

/// 1.0 in Q64.64
pub const ONE_Q64: i128 = Q64;

/// 0.5 in Q64.64
pub const HALF_Q64: i128 = Q64 / 2;

/// 2.0 in Q64.64
pub const TWO_Q64: i128 = 2 * Q64;

/// ln(2) ≈ 0.693147180559945 in Q64.64
pub const LN2_Q64: i128 = 12786308645202655659;

/// sqrt(252) trading-day annualization factor, approximated as 15.87401
/// in Q64.64 to match the precision of the fee-return inversion
pub const ANNUALIZATION_FACTOR_Q64: i128 = 292823799893506159447;

/// Term count for the alternating ln(1+z) series. Fixed property of the
/// implementation: more terms buy accuracy at higher cost.
pub const LN_SERIES_TERMS: u32 = 6;

/// Term count for the exp Taylor remainder after ln(2) argument reduction
pub const EXP_SERIES_TERMS: u32 = 12;

/// Iteration bound for the Newton square root
pub const SQRT_MAX_ITERATIONS: u32 = 64;

// ============================================================================
// Statistics Constants
// ============================================================================

/// Bounded capacity of the price/return series
pub const MAX_SERIES_OBSERVATIONS: usize = 1000;

// ============================================================================
// Solver Constants
// ============================================================================

/// Default iteration budget for the implied-volatility solver
pub const DEFAULT_SOLVER_MAX_ITERATIONS: u32 = 64;

/// Default convergence tolerance for the implied-volatility solver
/// (2^-32 ≈ 2.3e-10 in Q64.64)
pub const DEFAULT_SOLVER_TOLERANCE_Q64: i128 = 1i128 << 32;

// ============================================================================
// Fee Structure Constants
// ============================================================================

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default base fee (0.3%)
pub const DEFAULT_BASE_FEE_BPS: u64 = 30;

/// Minimum fee (0.01%)
pub const DEFAULT_MIN_FEE_BPS: u64 = 1;

/// Maximum fee (10%)
pub const DEFAULT_MAX_FEE_BPS: u64 = 1_000;

/// Default traded-volume threshold above which fees rise (token units)
pub const DEFAULT_VOLUME_HIGH_THRESHOLD: u128 = 1_000_000;

/// Default traded-volume threshold below which fees fall (token units)
pub const DEFAULT_VOLUME_LOW_THRESHOLD: u128 = 10_000;

/// Default maximum trade size (token units)
pub const DEFAULT_MAX_TRADE_SIZE: u128 = 100_000;

/// Default liquidity floor below which fees rise (token units)
pub const DEFAULT_LIQUIDITY_FLOOR: u128 = 50_000;

/// Default cost-signal deviation threshold (percent)
pub const DEFAULT_GAS_DEVIATION_THRESHOLD_PCT: u64 = 20;

// ============================================================================
// Post-Trade Adjustment Scales
// ============================================================================

/// Divisor applied to the cost-signal adjustment term
pub const COST_ADJUSTMENT_SCALE: i128 = 1_000_000_000;

/// Divisor applied to the slippage adjustment term
pub const SLIPPAGE_ADJUSTMENT_SCALE: i128 = 1_000;

/// Divisor applied to the volatility-delta adjustment term
pub const VOLATILITY_ADJUSTMENT_SCALE: i128 = 10_000;

/// Divisor applied to the liquidity-delta adjustment term
pub const LIQUIDITY_ADJUSTMENT_SCALE: i128 = 10_000_000_000_000_000_000_000;

// ============================================================================
// Smoothing Constants
// ============================================================================

/// Default EMA smoothing numerator
pub const DEFAULT_EMA_ALPHA: u64 = 200;

/// Default EMA smoothing denominator
pub const DEFAULT_EMA_PRECISION: u64 = 1_000;
