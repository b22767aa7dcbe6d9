//! # Fee Engine
//!
//! Composes a per-trade fee from a base rate and sequential
//! multiplicative adjustments (volatility, volume, trade size,
//! liquidity, smoothed cost signal), clamped to a configured band, and
//! tracks a per-trade context for the symmetric post-trade adjustment.
//! All behaviour is parameterized by a [`FeePolicy`] passed to the
//! constructor; there is no ambient configuration or caller-identity
//! gating.

pub mod smoothing;

use std::collections::HashMap;

use crate::constants::{
    BPS_DENOMINATOR, COST_ADJUSTMENT_SCALE, DEFAULT_BASE_FEE_BPS,
    DEFAULT_EMA_ALPHA, DEFAULT_EMA_PRECISION, DEFAULT_GAS_DEVIATION_THRESHOLD_PCT,
    DEFAULT_LIQUIDITY_FLOOR, DEFAULT_MAX_FEE_BPS, DEFAULT_MAX_TRADE_SIZE,
    DEFAULT_MIN_FEE_BPS, DEFAULT_VOLUME_HIGH_THRESHOLD,
    DEFAULT_VOLUME_LOW_THRESHOLD, LIQUIDITY_ADJUSTMENT_SCALE,
    SLIPPAGE_ADJUSTMENT_SCALE, VOLATILITY_ADJUSTMENT_SCALE,
};
use crate::errors::{CoreResult, EngineError};
use crate::market::MarketSnapshot;
use crate::math::big_int::{mul_div_u64, Rounding};
use crate::math::safe_math::{
    safe_add_i128, safe_add_u64, safe_cast_u128_to_i128, safe_mul_i128,
    safe_neg_i128, safe_sub_i128,
};

pub use smoothing::{ArithmeticAverage, GasCostEma};

/// Pool identifier, unique per engine instance
pub type PoolId = u64;

/// Trade identifier, unique for the lifetime of an engine instance
pub type TradeId = u64;

/// Fee-composition parameters, validated at engine construction
#[derive(Debug, Clone)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct FeePolicy {
    /// Starting fee before adjustments (basis points)
    pub base_fee_bps: u64,
    /// Lower clamp on the composed fee (basis points)
    pub min_fee_bps: u64,
    /// Upper clamp on the composed fee (basis points)
    pub max_fee_bps: u64,
    /// Volume above this raises the fee 10% (token units)
    pub volume_high_threshold: u128,
    /// Volume below this lowers the fee 10% (token units)
    pub volume_low_threshold: u128,
    /// Trades above half this size pay 20% more (token units)
    pub max_trade_size: u128,
    /// Liquidity below this raises the fee 50% (token units)
    pub liquidity_floor: u128,
    /// Cost-signal deviation from its EMA that triggers the ±20%
    /// adjustment (percent)
    pub gas_deviation_threshold_pct: u64,
    /// EMA smoothing numerator
    pub ema_alpha: u64,
    /// EMA smoothing denominator
    pub ema_precision: u64,
}

impl FeePolicy {
    /// Reject parameter combinations the composition cannot honor
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_fee_bps > self.max_fee_bps {
            return Err(EngineError::InvalidFeePolicy(
                "min_fee_bps exceeds max_fee_bps",
            ));
        }
        if self.volume_low_threshold > self.volume_high_threshold {
            return Err(EngineError::InvalidFeePolicy(
                "volume_low_threshold exceeds volume_high_threshold",
            ));
        }
        if self.max_trade_size == 0 {
            return Err(EngineError::InvalidFeePolicy("max_trade_size is zero"));
        }
        if self.ema_precision == 0 {
            return Err(EngineError::InvalidFeePolicy("ema_precision is zero"));
        }
        if self.ema_alpha > self.ema_precision {
            return Err(EngineError::InvalidFeePolicy(
                "ema_alpha exceeds ema_precision",
            ));
        }
        Ok(())
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            base_fee_bps: DEFAULT_BASE_FEE_BPS,
            min_fee_bps: DEFAULT_MIN_FEE_BPS,
            max_fee_bps: DEFAULT_MAX_FEE_BPS,
            volume_high_threshold: DEFAULT_VOLUME_HIGH_THRESHOLD,
            volume_low_threshold: DEFAULT_VOLUME_LOW_THRESHOLD,
            max_trade_size: DEFAULT_MAX_TRADE_SIZE,
            liquidity_floor: DEFAULT_LIQUIDITY_FLOOR,
            gas_deviation_threshold_pct: DEFAULT_GAS_DEVIATION_THRESHOLD_PCT,
            ema_alpha: DEFAULT_EMA_ALPHA,
            ema_precision: DEFAULT_EMA_PRECISION,
        }
    }
}

/// Ephemeral record bridging the pre-trade and post-trade steps
///
/// Created when a fee is quoted, consumed exactly once by the
/// post-trade adjustment.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeContext {
    /// Pool the trade executes against
    pub pool: PoolId,
    /// Signed trade size at quote time (token units)
    pub initial_amount: i128,
    /// Cost signal at quote time
    pub initial_cost_signal: u64,
    /// Fee quoted for the trade (basis points)
    pub applied_fee: u64,
    /// Quote timestamp (unix seconds)
    pub timestamp: i64,
    /// Market volatility at quote time (basis points)
    pub volatility_snapshot: u64,
    /// Pool liquidity at quote time (token units)
    pub liquidity_snapshot: u128,
}

/// Per-pool fee engine: owns the market snapshots, the cost-signal EMA,
/// and the live trade contexts
#[derive(Debug)]
pub struct FeeEngine {
    policy: FeePolicy,
    pools: HashMap<PoolId, MarketSnapshot>,
    contexts: HashMap<TradeId, TradeContext>,
    gas_ema: GasCostEma,
    next_trade_id: TradeId,
}

impl FeeEngine {
    /// Build an engine from a validated policy
    pub fn new(policy: FeePolicy) -> CoreResult<Self> {
        policy.validate()?;
        let gas_ema = GasCostEma::new(policy.ema_alpha, policy.ema_precision);
        Ok(Self {
            policy,
            pools: HashMap::new(),
            contexts: HashMap::new(),
            gas_ema,
            next_trade_id: 0,
        })
    }

    /// Seed a pool with an empty snapshot so it can be quoted before the
    /// first oracle refresh
    pub fn register_pool(&mut self, pool: PoolId) {
        self.pools.entry(pool).or_default();
    }

    /// Replace a pool's market snapshot wholesale, registering the pool
    /// if it is new
    pub fn refresh_market_snapshot(&mut self, pool: PoolId, snapshot: MarketSnapshot) {
        self.pools.insert(pool, snapshot);
    }

    /// Current snapshot for a pool, if registered
    pub fn snapshot(&self, pool: PoolId) -> Option<&MarketSnapshot> {
        self.pools.get(&pool)
    }

    /// Fold one cost-signal sample into the EMA and return the new level
    pub fn update_cost_ema(&mut self, signal: u64) -> u64 {
        self.gas_ema.update(signal)
    }

    /// Current smoothed cost-signal level, None before the first sample
    pub fn cost_ema_level(&self) -> Option<u64> {
        self.gas_ema.level()
    }

    /// Number of quoted trades awaiting their post-trade step
    pub fn open_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Quote the fee for a trade and open its context
    ///
    /// Adjustments apply sequentially to the running fee, in a fixed
    /// order, and the result is clamped to the policy band. Returns the
    /// fee in basis points together with the fresh trade identifier.
    pub fn compute_fee(
        &mut self,
        pool: PoolId,
        trade_size: i128,
        cost_signal: u64,
        timestamp: i64,
    ) -> CoreResult<(u64, TradeId)> {
        let snapshot = *self
            .pools
            .get(&pool)
            .ok_or(EngineError::UnknownPool(pool))?;

        let mut fee = self.policy.base_fee_bps;

        // 1. Volatility: fee * (10000 + vol) / 10000
        let scaled_vol = safe_add_u64(BPS_DENOMINATOR, snapshot.volatility_bps)?;
        fee = mul_div_u64(fee, scaled_vol, BPS_DENOMINATOR, Rounding::Down)?;

        // 2. Volume: ±10% against the high/low thresholds
        if snapshot.volume > self.policy.volume_high_threshold {
            fee = mul_div_u64(fee, 110, 100, Rounding::Down)?;
        } else if snapshot.volume < self.policy.volume_low_threshold {
            fee = mul_div_u64(fee, 90, 100, Rounding::Down)?;
        }

        // 3. Trade size: +20% above half the configured maximum
        if trade_size.unsigned_abs() > self.policy.max_trade_size / 2 {
            fee = mul_div_u64(fee, 120, 100, Rounding::Down)?;
        }

        // 4. Liquidity: +50% below the floor
        if snapshot.liquidity < self.policy.liquidity_floor {
            fee = mul_div_u64(fee, 150, 100, Rounding::Down)?;
        }

        // 5. Cost signal: ±20% on deviation from the EMA level. Dearer
        //    execution lowers the fee to keep flow coming; cheaper
        //    execution claws it back.
        if let Some(level) = self.gas_ema.level() {
            if level > 0 {
                let deviation = level.abs_diff(cost_signal);
                let deviation_pct = deviation as u128 * 100 / level as u128;
                if deviation_pct > self.policy.gas_deviation_threshold_pct as u128 {
                    if cost_signal > level {
                        fee = mul_div_u64(fee, 80, 100, Rounding::Down)?;
                    } else {
                        fee = mul_div_u64(fee, 120, 100, Rounding::Down)?;
                    }
                }
            }
        }

        // 6. Clamp to the policy band
        fee = fee.clamp(self.policy.min_fee_bps, self.policy.max_fee_bps);

        let trade_id = self.next_trade_id;
        self.next_trade_id += 1;
        self.contexts.insert(
            trade_id,
            TradeContext {
                pool,
                initial_amount: trade_size,
                initial_cost_signal: cost_signal,
                applied_fee: fee,
                timestamp,
                volatility_snapshot: snapshot.volatility_bps,
                liquidity_snapshot: snapshot.liquidity,
            },
        );

        Ok((fee, trade_id))
    }

    /// Settle a quoted trade and return the signed post-trade adjustment
    ///
    /// Consumes the trade context exactly once: a second call with the
    /// same identifier fails. Three additive terms (cost-signal drift,
    /// slippage against the quoted amount, and market-condition drift)
    /// are computed against the pool's current snapshot. The context is
    /// only removed after every term has been computed, so a failing
    /// term leaves the engine unchanged.
    pub fn apply_post_trade_adjustment(
        &mut self,
        trade_id: TradeId,
        realized_delta: i128,
        cost_signal: u64,
    ) -> CoreResult<i128> {
        let context = *self
            .contexts
            .get(&trade_id)
            .ok_or(EngineError::UnknownTradeContext(trade_id))?;
        let snapshot = self
            .pools
            .get(&context.pool)
            .ok_or(EngineError::UnknownPool(context.pool))?;

        let fee = context.applied_fee as i128;

        // 1. Cost-signal term: (current - initial) * fee / 1e9
        let cost_delta = cost_signal as i128 - context.initial_cost_signal as i128;
        let cost_term = safe_mul_i128(cost_delta, fee)? / COST_ADJUSTMENT_SCALE;

        // 2. Slippage term: (realized - quoted) / 1000
        let slippage_term =
            safe_sub_i128(realized_delta, context.initial_amount)? / SLIPPAGE_ADJUSTMENT_SCALE;

        // 3. Market-condition term: volatility and liquidity drift since
        //    the quote
        let vol_delta =
            snapshot.volatility_bps as i128 - context.volatility_snapshot as i128;
        let vol_term = safe_mul_i128(vol_delta, fee)? / VOLATILITY_ADJUSTMENT_SCALE;
        let liq_delta =
            signed_delta(snapshot.liquidity, context.liquidity_snapshot)?;
        let liq_term = safe_mul_i128(liq_delta, fee)? / LIQUIDITY_ADJUSTMENT_SCALE;

        let adjustment = safe_add_i128(
            safe_add_i128(cost_term, slippage_term)?,
            safe_add_i128(vol_term, liq_term)?,
        )?;

        self.contexts.remove(&trade_id);
        Ok(adjustment)
    }
}

/// Signed difference of two u128 quantities
fn signed_delta(current: u128, initial: u128) -> CoreResult<i128> {
    if current >= initial {
        safe_cast_u128_to_i128(current - initial).map_err(|_| EngineError::MathOverflow)
    } else {
        let magnitude = safe_cast_u128_to_i128(initial - current)
            .map_err(|_| EngineError::MathOverflow)?;
        safe_neg_i128(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_snapshot() -> MarketSnapshot {
        MarketSnapshot::new(0, DEFAULT_LIQUIDITY_FLOOR, DEFAULT_VOLUME_LOW_THRESHOLD, 100)
    }

    fn engine_with_pool(snapshot: MarketSnapshot) -> FeeEngine {
        let mut engine = FeeEngine::new(FeePolicy::default()).unwrap();
        engine.refresh_market_snapshot(1, snapshot);
        engine
    }

    #[test]
    fn test_policy_validation() {
        let mut policy = FeePolicy::default();
        assert!(policy.validate().is_ok());

        policy.min_fee_bps = policy.max_fee_bps + 1;
        assert!(matches!(
            FeeEngine::new(policy),
            Err(EngineError::InvalidFeePolicy(_))
        ));

        let mut policy = FeePolicy::default();
        policy.ema_alpha = policy.ema_precision + 1;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_unknown_pool() {
        let mut engine = FeeEngine::new(FeePolicy::default()).unwrap();
        assert_eq!(
            engine.compute_fee(9, 100, 10, 0),
            Err(EngineError::UnknownPool(9))
        );
    }

    #[test]
    fn test_quiet_market_quotes_base_fee() {
        let mut engine = engine_with_pool(quiet_snapshot());
        let (fee, _) = engine.compute_fee(1, 10, 10, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS);
    }

    #[test]
    fn test_volatility_scales_fee() {
        // 100% volatility doubles the fee
        let mut engine = engine_with_pool(MarketSnapshot::new(
            10_000,
            DEFAULT_LIQUIDITY_FLOOR,
            DEFAULT_VOLUME_LOW_THRESHOLD,
            100,
        ));
        let (fee, _) = engine.compute_fee(1, 10, 10, 0).unwrap();
        assert_eq!(fee, 2 * DEFAULT_BASE_FEE_BPS);
    }

    #[test]
    fn test_volume_adjustments() {
        let mut snapshot = quiet_snapshot();
        snapshot.volume = DEFAULT_VOLUME_HIGH_THRESHOLD + 1;
        let mut engine = engine_with_pool(snapshot);
        let (fee, _) = engine.compute_fee(1, 10, 10, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS * 110 / 100);

        let mut snapshot = quiet_snapshot();
        snapshot.volume = DEFAULT_VOLUME_LOW_THRESHOLD - 1;
        let mut engine = engine_with_pool(snapshot);
        let (fee, _) = engine.compute_fee(1, 10, 10, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS * 90 / 100);
    }

    #[test]
    fn test_large_trade_and_thin_liquidity() {
        let mut engine = engine_with_pool(quiet_snapshot());
        let big = (DEFAULT_MAX_TRADE_SIZE / 2 + 1) as i128;
        let (fee, _) = engine.compute_fee(1, big, 10, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS * 120 / 100);

        // Sign of the trade does not matter, only magnitude
        let (fee_sell, _) = engine.compute_fee(1, -big, 10, 0).unwrap();
        assert_eq!(fee_sell, fee);

        let mut snapshot = quiet_snapshot();
        snapshot.liquidity = DEFAULT_LIQUIDITY_FLOOR - 1;
        let mut engine = engine_with_pool(snapshot);
        let (fee, _) = engine.compute_fee(1, 10, 10, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS * 150 / 100);
    }

    #[test]
    fn test_cost_signal_adjustments() {
        // Dearer execution than the EMA: fee drops 20%
        let mut engine = engine_with_pool(quiet_snapshot());
        engine.update_cost_ema(100);
        let (fee, _) = engine.compute_fee(1, 10, 130, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS * 80 / 100);

        // Cheaper execution: fee rises 20%
        let (fee, _) = engine.compute_fee(1, 10, 70, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS * 120 / 100);

        // Within the deviation threshold: no adjustment
        let (fee, _) = engine.compute_fee(1, 10, 110, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS);

        // Before the first EMA sample the adjustment is skipped
        let mut cold = engine_with_pool(quiet_snapshot());
        let (fee, _) = cold.compute_fee(1, 10, 1_000_000, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS);
    }

    #[test]
    fn test_fee_clamped_to_band() {
        // Everything stacked against the trader still clamps at max
        let mut engine = engine_with_pool(MarketSnapshot::new(
            1_000_000,
            0,
            u128::MAX,
            100,
        ));
        engine.update_cost_ema(1_000);
        let (fee, _) = engine
            .compute_fee(1, i128::MAX, 1, 0)
            .unwrap();
        assert_eq!(fee, DEFAULT_MAX_FEE_BPS);
    }

    #[test]
    fn test_trade_ids_are_sequential_and_unique() {
        let mut engine = engine_with_pool(quiet_snapshot());
        let (_, first) = engine.compute_fee(1, 10, 10, 0).unwrap();
        let (_, second) = engine.compute_fee(1, 10, 10, 0).unwrap();
        assert_ne!(first, second);
        assert_eq!(second, first + 1);
        assert_eq!(engine.open_contexts(), 2);
    }

    #[test]
    fn test_post_trade_consumes_context_exactly_once() {
        let mut engine = engine_with_pool(quiet_snapshot());
        let (_, trade_id) = engine.compute_fee(1, 1000, 50, 0).unwrap();

        assert!(engine
            .apply_post_trade_adjustment(trade_id, 1000, 50)
            .is_ok());
        assert_eq!(
            engine.apply_post_trade_adjustment(trade_id, 1000, 50),
            Err(EngineError::UnknownTradeContext(trade_id))
        );
    }

    #[test]
    fn test_post_trade_unknown_id_fails() {
        let mut engine = engine_with_pool(quiet_snapshot());
        assert_eq!(
            engine.apply_post_trade_adjustment(404, 0, 0),
            Err(EngineError::UnknownTradeContext(404))
        );
    }

    #[test]
    fn test_post_trade_adjustment_terms() {
        let mut engine = engine_with_pool(quiet_snapshot());
        let (fee, trade_id) = engine.compute_fee(1, 10_000, 50, 0).unwrap();
        assert_eq!(fee, DEFAULT_BASE_FEE_BPS);

        // Volatility rose 500 bps and liquidity fell between quote and
        // settlement
        let mut moved = quiet_snapshot();
        moved.volatility_bps = 500;
        moved.liquidity = DEFAULT_LIQUIDITY_FLOOR - 20_000;
        engine.refresh_market_snapshot(1, moved);

        // Cost signal moved 50 -> 2_000_000_050, slippage 10_000 -> 14_000
        let adjustment = engine
            .apply_post_trade_adjustment(trade_id, 14_000, 2_000_000_050)
            .unwrap();

        let cost_term = 2_000_000_000i128 * fee as i128 / 1_000_000_000;
        let slippage_term = 4_000 / 1_000;
        let vol_term = 500 * fee as i128 / 10_000;
        // Liquidity delta is far below the 1e22 scale: term truncates to 0
        let expected = cost_term + slippage_term + vol_term;
        assert_eq!(adjustment, expected);
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(10, 4).unwrap(), 6);
        assert_eq!(signed_delta(4, 10).unwrap(), -6);
        assert_eq!(signed_delta(7, 7).unwrap(), 0);
        assert!(signed_delta(u128::MAX, 0).is_err());
    }
}
