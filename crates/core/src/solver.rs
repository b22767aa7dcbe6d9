//! # Volatility Solver
//!
//! Two estimation paths: the closed-form annualized sigma/drift from
//! accumulated return statistics, and an iterative solver that recovers
//! the (sigma, drift) pair implied by a single pool-fee-return
//! observation. The implied equation is a fixed-point problem in the
//! drift `u`, iterated to a tolerance under a hard iteration budget.

use crate::constants::{
    ANNUALIZATION_FACTOR_Q64, DEFAULT_SOLVER_MAX_ITERATIONS,
    DEFAULT_SOLVER_TOLERANCE_Q64,
};
use crate::errors::CoreResult;
use crate::math::fixed_point::{abs_q64, div_q64, from_int, mul_q64, sub_q64};
use crate::math::transcendental::{cosh_q64, ln_q64, sqrt_q64};
use crate::stats::ReturnSeries;

/// Iteration budget and convergence tolerance for the implied solver
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverParams {
    /// Maximum fixed-point iterations before giving up
    pub max_iterations: u32,
    /// Convergence threshold on |u_{i+1} - u_i| (Q64.64)
    pub tolerance: i128,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_SOLVER_MAX_ITERATIONS,
            tolerance: DEFAULT_SOLVER_TOLERANCE_Q64,
        }
    }
}

/// Closed-form estimate from accumulated statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct SigmaDrift {
    /// Annualized volatility (Q64.64)
    pub sigma: i128,
    /// Drift net of the volatility correction (Q64.64)
    pub drift: i128,
}

/// Result of the iterative implied-volatility solve
///
/// The last computed pair is returned whether or not the iteration
/// converged; `converged` distinguishes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct ImpliedVolSolution {
    /// Implied volatility (Q64.64)
    pub sigma: i128,
    /// Implied drift `u` (Q64.64)
    pub drift: i128,
    /// Iterations actually performed
    pub iterations: u32,
    /// Whether the step fell below the tolerance within the budget
    pub converged: bool,
}

/// Drift from a pool return and a volatility level: mu - sigma^2 / 2
pub fn drift(mu_pool: i128, sigma: i128) -> CoreResult<i128> {
    sub_q64(mu_pool, mul_q64(sigma, sigma)? / 2)
}

/// Annualized sigma and drift from the accumulated return statistics
///
/// `sigma = sqrt(variance) * sqrt(252)`, with the annualization factor
/// carried at the fixed-point precision of the format, then
/// `drift = mean - sigma^2 / 2`.
pub fn annualized_sigma_and_drift(series: &ReturnSeries) -> CoreResult<SigmaDrift> {
    let std_dev = sqrt_q64(series.variance()?)?;
    let sigma = mul_q64(std_dev, ANNUALIZATION_FACTOR_Q64)?;
    let drift = drift(series.mean(), sigma)?;
    Ok(SigmaDrift { sigma, drift })
}

/// Jointly estimate (sigma, u) implied by one fee return over `period`,
/// starting the iteration from `u_0 = mu_pool`
pub fn solve_implied(
    mu_pool: i128,
    period: i128,
    params: &SolverParams,
) -> CoreResult<ImpliedVolSolution> {
    solve_implied_from(mu_pool, mu_pool, period, params)
}

/// Jointly estimate (sigma, u) from an explicit starting drift
///
/// Each step evaluates
/// `sigma_i = sqrt((8/t) * (mu_pool*t - ln(cosh(u_i*t/2))))` and feeds
/// it back through the drift formula. Stops when the step on `u` falls
/// below the tolerance or the iteration budget is exhausted.
pub fn solve_implied_from(
    mu_pool: i128,
    initial_drift: i128,
    period: i128,
    params: &SolverParams,
) -> CoreResult<ImpliedVolSolution> {
    let eight_over_t = div_q64(from_int(8), period)?;
    let mu_t = mul_q64(mu_pool, period)?;

    let mut u = initial_drift;
    let mut sigma = 0i128;
    let mut iterations = 0;
    let mut converged = false;

    for i in 0..params.max_iterations {
        let half_ut = mul_q64(u, period)? / 2;
        let inner = sub_q64(mu_t, ln_q64(cosh_q64(half_ut)?)?)?;
        sigma = sqrt_q64(mul_q64(eight_over_t, inner)?)?;

        let next_u = drift(mu_pool, sigma)?;
        let step = abs_q64(sub_q64(next_u, u)?)?;
        u = next_u;
        iterations = i + 1;

        if step < params.tolerance {
            converged = true;
            break;
        }
    }

    Ok(ImpliedVolSolution {
        sigma,
        drift: u,
        iterations,
        converged,
    })
}
