use riptide_core::FeePolicy;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{KeeperError, KeeperResult};

/// Keeper configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Tick interval in seconds
    pub interval_secs: u64,

    /// Price feed configuration
    pub feed: FeedConfig,

    /// List of pools to quote
    pub pools: Vec<PoolConfig>,
}

/// Price feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Feed mode: simulated random walk or CSV replay
    pub mode: FeedMode,

    /// Path to the replay CSV (price,cost_signal,liquidity,volume per line)
    pub csv_path: Option<String>,

    /// Seed for the simulated walk
    pub seed: u64,

    /// Starting price for the simulated walk
    pub initial_price: f64,

    /// Maximum per-tick price step (basis points)
    pub step_bps: u64,

    /// Baseline cost signal for the simulated walk
    pub base_cost_signal: u64,

    /// Maximum per-tick cost-signal jitter
    pub cost_signal_jitter: u64,

    /// Simulated pool liquidity (token units)
    pub liquidity: u64,

    /// Simulated traded volume per window (token units)
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    Simulate,
    Replay,
}

/// Configuration for an individual pool
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Pool identifier
    pub id: u64,

    /// Pool name for logging
    pub name: String,

    /// Whether this pool is quoted
    pub enabled: bool,

    /// Trade size used for the simulated trade cycle (token units)
    pub simulated_trade_size: i64,

    /// Starting fee before adjustments (basis points)
    pub base_fee_bps: u64,

    /// Lower fee clamp (basis points)
    pub min_fee_bps: u64,

    /// Upper fee clamp (basis points)
    pub max_fee_bps: u64,

    /// Volume above this raises the fee (token units)
    pub volume_high_threshold: u64,

    /// Volume below this lowers the fee (token units)
    pub volume_low_threshold: u64,

    /// Maximum trade size (token units)
    pub max_trade_size: u64,

    /// Liquidity floor (token units)
    pub liquidity_floor: u64,

    /// Cost-signal deviation threshold (percent)
    pub gas_deviation_threshold_pct: u64,

    /// EMA smoothing numerator
    pub ema_alpha: u64,

    /// EMA smoothing denominator
    pub ema_precision: u64,
}

impl KeeperConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> KeeperResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            KeeperError::InvalidConfig(format!("failed to read config file {}: {}", path, e))
        })?;

        let config: KeeperConfig = toml::from_str(&content).map_err(|e| {
            KeeperError::ParseError(format!("failed to parse config file {}: {}", path, e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> KeeperResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            KeeperError::ParseError(format!("failed to serialize config: {}", e))
        })?;
        fs::write(path, content).map_err(|e| {
            KeeperError::InvalidConfig(format!("failed to write config file {}: {}", path, e))
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> KeeperResult<()> {
        if self.interval_secs == 0 {
            return Err(KeeperError::InvalidConfig(
                "interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.pools.is_empty() {
            return Err(KeeperError::InvalidConfig(
                "at least one pool must be configured".to_string(),
            ));
        }

        self.feed.validate()?;

        for pool in &self.pools {
            pool.validate()?;
        }

        Ok(())
    }

    /// Get enabled pools
    pub fn enabled_pools(&self) -> Vec<&PoolConfig> {
        self.pools.iter().filter(|p| p.enabled).collect()
    }
}

impl FeedConfig {
    fn validate(&self) -> KeeperResult<()> {
        match self.mode {
            FeedMode::Replay => {
                if self.csv_path.is_none() {
                    return Err(KeeperError::InvalidConfig(
                        "replay mode requires csv_path".to_string(),
                    ));
                }
            }
            FeedMode::Simulate => {
                if self.initial_price <= 0.0 {
                    return Err(KeeperError::InvalidConfig(format!(
                        "initial_price must be positive, got {}",
                        self.initial_price
                    )));
                }
                if self.step_bps >= 10_000 {
                    return Err(KeeperError::InvalidConfig(format!(
                        "step_bps must be below 10000, got {}",
                        self.step_bps
                    )));
                }
            }
        }
        Ok(())
    }
}

impl PoolConfig {
    fn validate(&self) -> KeeperResult<()> {
        if self.name.is_empty() {
            return Err(KeeperError::InvalidConfig(
                "pool name must not be empty".to_string(),
            ));
        }

        if self.simulated_trade_size == 0 {
            return Err(KeeperError::InvalidConfig(format!(
                "pool {}: simulated_trade_size must be non-zero",
                self.name
            )));
        }

        // Reuse the engine-side validation for the policy parameters
        self.fee_policy().validate().map_err(|e| {
            KeeperError::InvalidConfig(format!("pool {}: {}", self.name, e))
        })?;

        Ok(())
    }

    /// Build the engine policy from this pool's parameters
    pub fn fee_policy(&self) -> FeePolicy {
        FeePolicy {
            base_fee_bps: self.base_fee_bps,
            min_fee_bps: self.min_fee_bps,
            max_fee_bps: self.max_fee_bps,
            volume_high_threshold: self.volume_high_threshold as u128,
            volume_low_threshold: self.volume_low_threshold as u128,
            max_trade_size: self.max_trade_size as u128,
            liquidity_floor: self.liquidity_floor as u128,
            gas_deviation_threshold_pct: self.gas_deviation_threshold_pct,
            ema_alpha: self.ema_alpha,
            ema_precision: self.ema_precision,
        }
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            feed: FeedConfig::default(),
            pools: vec![],
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::Simulate,
            csv_path: None,
            seed: 42,
            initial_price: 100.0,
            step_bps: 50,
            base_cost_signal: 40,
            cost_signal_jitter: 15,
            liquidity: 500_000,
            volume: 100_000,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        let policy = FeePolicy::default();
        Self {
            id: 0,
            name: "Default Pool".to_string(),
            enabled: true,
            simulated_trade_size: 10_000,
            base_fee_bps: policy.base_fee_bps,
            min_fee_bps: policy.min_fee_bps,
            max_fee_bps: policy.max_fee_bps,
            volume_high_threshold: policy.volume_high_threshold as u64,
            volume_low_threshold: policy.volume_low_threshold as u64,
            max_trade_size: policy.max_trade_size as u64,
            liquidity_floor: policy.liquidity_floor as u64,
            gas_deviation_threshold_pct: policy.gas_deviation_threshold_pct,
            ema_alpha: policy.ema_alpha,
            ema_precision: policy.ema_precision,
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> KeeperResult<()> {
    let example_config = KeeperConfig {
        interval_secs: 5,
        feed: FeedConfig::default(),
        pools: vec![
            PoolConfig {
                id: 1,
                name: "SOL/USDC".to_string(),
                ..PoolConfig::default()
            },
            PoolConfig {
                id: 2,
                name: "ETH/USDC".to_string(),
                base_fee_bps: 25,
                ..PoolConfig::default()
            },
        ],
    };

    example_config.save(path)?;
    Ok(())
}
