//! # Math Module
//!
//! Deterministic numerics for the engine: checked integer arithmetic,
//! 256-bit intermediates, signed Q64.64 fixed point, and the
//! transcendental approximations built on top of it.

pub mod big_int;
pub mod fixed_point;
pub mod safe_math;
pub mod transcendental;

pub use big_int::{mul_div_u64, Rounding, U256};
pub use fixed_point::{
    abs_q64, add_q64, div_q64, from_f64, from_int, mul_q64, neg_q64, sub_q64,
    to_f64, to_int,
};
pub use transcendental::{cosh_q64, exp_q64, ln_q64, sqrt_q64};
