//! Keeper tick loop
//!
//! One [`Runner`] owns a feed and one engine per enabled pool. Each tick
//! feeds the price into the pool's return series, folds the cost signal
//! into the EMA, refreshes the market snapshot from the latest
//! volatility estimate, and (outside dry-run) exercises a full
//! pre-trade / post-trade quote cycle.

use riptide_core::math::{from_f64, to_f64};
use riptide_core::solver::annualized_sigma_and_drift;
use riptide_core::{
    EngineError, FeeEngine, MarketSnapshot, ReturnSeries, SignalReading,
};

use crate::config::{KeeperConfig, PoolConfig};
use crate::error::{KeeperError, KeeperResult};
use crate::feed::{FeedTick, PriceFeed};

/// Drives the fee engines from the configured feed
pub struct Runner {
    feed: PriceFeed,
    pools: Vec<PoolRunner>,
    dry_run: bool,
    ticks_processed: u64,
    quotes_issued: u64,
}

struct PoolRunner {
    config: PoolConfig,
    engine: FeeEngine,
    series: ReturnSeries,
}

impl Runner {
    /// Build a runner from validated configuration
    pub fn new(config: &KeeperConfig, dry_run: bool) -> KeeperResult<Self> {
        let feed = PriceFeed::from_config(&config.feed)?;

        let mut pools = Vec::new();
        for pool_config in config.enabled_pools() {
            let mut engine = FeeEngine::new(pool_config.fee_policy())?;
            engine.register_pool(pool_config.id);
            pools.push(PoolRunner {
                config: pool_config.clone(),
                engine,
                series: ReturnSeries::new(),
            });
        }

        if pools.is_empty() {
            return Err(KeeperError::InvalidConfig(
                "no enabled pools".to_string(),
            ));
        }

        Ok(Self {
            feed,
            pools,
            dry_run,
            ticks_processed: 0,
            quotes_issued: 0,
        })
    }

    /// Process one feed tick; returns false once the feed is exhausted
    pub fn run_tick(&mut self, now: i64) -> KeeperResult<bool> {
        let Some(tick) = self.feed.next_tick() else {
            return Ok(false);
        };
        self.ticks_processed += 1;

        let price = from_f64(tick.price)?;
        for pool in &mut self.pools {
            if pool.observe(price, &tick, now, self.dry_run)? {
                self.quotes_issued += 1;
            }
        }

        Ok(true)
    }

    /// Ticks consumed so far
    pub fn ticks_processed(&self) -> u64 {
        self.ticks_processed
    }

    /// Quote cycles completed so far
    pub fn quotes_issued(&self) -> u64 {
        self.quotes_issued
    }
}

impl PoolRunner {
    /// Fold one tick into this pool; returns whether a quote was issued
    fn observe(
        &mut self,
        price: i128,
        tick: &FeedTick,
        now: i64,
        dry_run: bool,
    ) -> KeeperResult<bool> {
        match self.series.add_price(price) {
            Ok(()) => {}
            Err(EngineError::SeriesCapacityExceeded(_)) => {
                // The series is bounded; start a fresh sampling window
                log::debug!(
                    "pool {}: return series full, restarting window",
                    self.config.name
                );
                self.series = ReturnSeries::new();
                self.series.add_price(price)?;
            }
            Err(e) => return Err(e.into()),
        }

        self.engine.update_cost_ema(tick.cost_signal);

        // Variance needs at least two returns
        if self.series.len() < 2 {
            return Ok(false);
        }

        let estimate = annualized_sigma_and_drift(&self.series)?;
        let volatility_bps = (to_f64(estimate.sigma) * 10_000.0).round().max(0.0) as u64;
        let snapshot = MarketSnapshot::from_readings(
            SignalReading { value: volatility_bps, updated_at: now },
            SignalReading { value: tick.liquidity, updated_at: now },
            SignalReading { value: tick.volume, updated_at: now },
        );
        self.engine.refresh_market_snapshot(self.config.id, snapshot);
        log::debug!(
            "pool {}: sigma {:.6}, drift {:.6}, snapshot vol {} bps",
            self.config.name,
            to_f64(estimate.sigma),
            to_f64(estimate.drift),
            volatility_bps
        );

        if dry_run {
            return Ok(false);
        }

        // Simulated trade cycle: quote, execute with a small fixed slip,
        // settle against the same tick
        let size = self.config.simulated_trade_size as i128;
        let (fee, trade_id) =
            self.engine
                .compute_fee(self.config.id, size, tick.cost_signal, now)?;
        let realized = size + size / 200;
        let adjustment =
            self.engine
                .apply_post_trade_adjustment(trade_id, realized, tick.cost_signal)?;

        log::info!(
            "pool {}: quoted {} bps (trade {}), post-trade adjustment {}",
            self.config.name,
            fee,
            trade_id,
            adjustment
        );

        Ok(true)
    }
}
