//! # Engine Flow Tests
//!
//! End-to-end exercises of the public surface: price ingestion through
//! volatility estimation into fee quoting and post-trade settlement,
//! plus property tests over the fee band and the statistics accumulator.

use approx::assert_relative_eq;
use proptest::prelude::*;

use riptide_core::math::{from_f64, to_f64};
use riptide_core::solver::{annualized_sigma_and_drift, solve_implied, SolverParams};
use riptide_core::{
    EngineError, FeeEngine, FeePolicy, MarketSnapshot, ReturnSeries,
};

/// Full trade lifecycle: prices in, estimate out, quote, settle.
#[test]
fn test_full_trade_cycle() {
    // Accumulate a short price history
    let mut series = ReturnSeries::new();
    for &price in &[100.0, 101.2, 100.4, 102.1, 101.7, 103.0] {
        series.add_price(from_f64(price).unwrap()).unwrap();
    }
    assert_eq!(series.len(), 5);

    let estimate = annualized_sigma_and_drift(&series).unwrap();
    assert!(estimate.sigma > 0);

    // Feed the estimate into a quoting engine as the pool's volatility
    let sigma_bps = (to_f64(estimate.sigma) * 10_000.0) as u64;
    let mut engine = FeeEngine::new(FeePolicy::default()).unwrap();
    engine.refresh_market_snapshot(7, MarketSnapshot::new(sigma_bps, 80_000, 20_000, 1_000));
    engine.update_cost_ema(55);

    let (fee, trade_id) = engine.compute_fee(7, 12_000, 57, 1_001).unwrap();
    let policy = FeePolicy::default();
    assert!(fee >= policy.min_fee_bps && fee <= policy.max_fee_bps);

    // The trade executes externally; market conditions move a little
    engine.refresh_market_snapshot(7, MarketSnapshot::new(sigma_bps + 40, 75_000, 21_000, 1_002));

    let adjustment = engine
        .apply_post_trade_adjustment(trade_id, 12_500, 58)
        .unwrap();
    // Small moves produce a small signed adjustment
    assert!(adjustment.unsigned_abs() < 1_000);

    // The context is gone
    assert_eq!(
        engine.apply_post_trade_adjustment(trade_id, 12_500, 58),
        Err(EngineError::UnknownTradeContext(trade_id))
    );
    assert_eq!(engine.open_contexts(), 0);
}

/// The implied solver agrees with the closed-form drift relation once
/// converged, starting from nothing but a fee return.
#[test]
fn test_implied_solution_consistency() {
    let mu = from_f64(0.04).unwrap();
    let period = from_f64(0.5).unwrap();

    let solution = solve_implied(mu, period, &SolverParams::default()).unwrap();
    assert!(solution.converged);

    let sigma = to_f64(solution.sigma);
    let u = to_f64(solution.drift);
    assert_relative_eq!(u, 0.04 - sigma * sigma / 2.0, epsilon = 1e-6);
}

#[test]
fn test_variance_matches_reference_sequence() {
    // Returns fed in real terms; statistics match the two-pass values
    let mut series = ReturnSeries::new();
    for &r in &[0.01, -0.02, 0.015] {
        series.add_return(from_f64(r).unwrap()).unwrap();
    }

    assert_eq!(series.len(), 3);
    assert_relative_eq!(to_f64(series.mean()), 0.0016667, epsilon = 1e-6);
    assert_relative_eq!(
        to_f64(series.variance().unwrap()),
        0.00035833,
        epsilon = 1e-6
    );
}

proptest! {
    /// The composed fee never leaves the policy band, whatever the
    /// snapshot or trade looks like.
    #[test]
    fn prop_fee_stays_in_band(
        volatility in 0u64..200_000,
        liquidity in 0u128..1_000_000_000,
        volume in 0u128..1_000_000_000,
        trade_size in i128::MIN..i128::MAX,
        cost_signal in 0u64..1_000_000,
        ema_seed in 1u64..1_000_000,
    ) {
        let policy = FeePolicy::default();
        let mut engine = FeeEngine::new(policy.clone()).unwrap();
        engine.refresh_market_snapshot(1, MarketSnapshot::new(volatility, liquidity, volume, 0));
        engine.update_cost_ema(ema_seed);

        let (fee, _) = engine.compute_fee(1, trade_size, cost_signal, 0).unwrap();
        prop_assert!(fee >= policy.min_fee_bps);
        prop_assert!(fee <= policy.max_fee_bps);
    }

    /// Welford's accumulator matches two-pass statistics for arbitrary
    /// bounded return sequences.
    #[test]
    fn prop_welford_matches_two_pass(
        returns in prop::collection::vec(-0.2f64..0.2, 2..50)
    ) {
        let mut series = ReturnSeries::new();
        for &r in &returns {
            series.add_return(from_f64(r).unwrap()).unwrap();
        }

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance = returns
            .iter()
            .map(|r| (r - mean) * (r - mean))
            .sum::<f64>()
            / (returns.len() - 1) as f64;

        prop_assert!((to_f64(series.mean()) - mean).abs() < 1e-6);
        prop_assert!((to_f64(series.variance().unwrap()) - variance).abs() < 1e-6);
        prop_assert!(series.variance().unwrap() >= 0);
    }
}
