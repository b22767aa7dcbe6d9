//! # Riptide Core: Adaptive Fee Engine
//!
//! The numerical engine behind the fee policy: deterministic signed
//! Q64.64 fixed-point arithmetic, transcendental approximations built on
//! it, an online mean/variance accumulator over logarithmic returns, a
//! volatility/drift solver, and the fee-composition logic that consumes
//! their outputs.
//!
//! Execution is strictly single-threaded and synchronous: every engine
//! operation either completes fully or fails leaving state unchanged,
//! and nothing is retried internally.
//!
//! ## Feature Flags
//!
//! - `client`: enables serde serialization on the public value types

pub mod constants;
pub mod errors;
pub mod fee;
pub mod market;
pub mod math;
pub mod solver;
pub mod stats;

// Re-export commonly used items
pub use constants::*;
pub use errors::{CoreResult, EngineError};
pub use fee::{FeeEngine, FeePolicy, GasCostEma, PoolId, TradeContext, TradeId};
pub use market::{MarketSnapshot, SignalReading};
pub use solver::{ImpliedVolSolution, SigmaDrift, SolverParams};
pub use stats::ReturnSeries;
