//! Price feed for the keeper loop
//!
//! Two sources: a seeded random-walk simulator and a CSV replay file
//! with one `price,cost_signal,liquidity,volume` record per line. Both
//! produce the same tick shape; the runner does not care which one it
//! is driven by.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;

use crate::config::{FeedConfig, FeedMode};
use crate::error::{KeeperError, KeeperResult};

/// One observation from the feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedTick {
    /// Asset price in display units
    pub price: f64,
    /// Transaction-cost signal
    pub cost_signal: u64,
    /// Pool liquidity (token units)
    pub liquidity: u64,
    /// Traded volume over the window (token units)
    pub volume: u64,
}

/// Tick source for the keeper loop
pub enum PriceFeed {
    /// Seeded random walk
    Simulated {
        rng: StdRng,
        price: f64,
        step_bps: u64,
        base_cost_signal: u64,
        cost_signal_jitter: u64,
        liquidity: u64,
        volume: u64,
    },
    /// Recorded ticks replayed in order
    Replay { ticks: Vec<FeedTick>, cursor: usize },
}

impl PriceFeed {
    /// Build a feed from the configuration
    pub fn from_config(config: &FeedConfig) -> KeeperResult<Self> {
        match config.mode {
            FeedMode::Simulate => Ok(Self::Simulated {
                rng: StdRng::seed_from_u64(config.seed),
                price: config.initial_price,
                step_bps: config.step_bps,
                base_cost_signal: config.base_cost_signal,
                cost_signal_jitter: config.cost_signal_jitter,
                liquidity: config.liquidity,
                volume: config.volume,
            }),
            FeedMode::Replay => {
                let path = config.csv_path.as_deref().ok_or_else(|| {
                    KeeperError::InvalidConfig("replay mode requires csv_path".to_string())
                })?;
                let ticks = load_replay_file(path)?;
                Ok(Self::Replay { ticks, cursor: 0 })
            }
        }
    }

    /// Produce the next tick; None once a replay feed is exhausted
    pub fn next_tick(&mut self) -> Option<FeedTick> {
        match self {
            Self::Simulated {
                rng,
                price,
                step_bps,
                base_cost_signal,
                cost_signal_jitter,
                liquidity,
                volume,
            } => {
                let step = rng.gen_range(-(*step_bps as i64)..=(*step_bps as i64));
                *price *= 1.0 + step as f64 / 10_000.0;

                let jitter = *cost_signal_jitter as i64;
                let cost_delta = rng.gen_range(-jitter..=jitter);
                let cost_signal = (*base_cost_signal as i64 + cost_delta).max(1) as u64;

                Some(FeedTick {
                    price: *price,
                    cost_signal,
                    liquidity: *liquidity,
                    volume: *volume,
                })
            }
            Self::Replay { ticks, cursor } => {
                let tick = ticks.get(*cursor).copied();
                if tick.is_some() {
                    *cursor += 1;
                }
                tick
            }
        }
    }
}

/// Parse a replay CSV: `price,cost_signal,liquidity,volume` per line,
/// empty lines and `#` comments skipped
fn load_replay_file(path: &str) -> KeeperResult<Vec<FeedTick>> {
    let content = fs::read_to_string(path)?;
    let mut ticks = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(KeeperError::FeedError(format!(
                "{}:{}: expected 4 fields, got {}",
                path,
                line_no + 1,
                fields.len()
            )));
        }

        let parse = |field: &str, name: &str| -> KeeperResult<u64> {
            field.parse::<u64>().map_err(|e| {
                KeeperError::FeedError(format!(
                    "{}:{}: bad {}: {}",
                    path,
                    line_no + 1,
                    name,
                    e
                ))
            })
        };

        let price: f64 = fields[0].parse().map_err(|e| {
            KeeperError::FeedError(format!("{}:{}: bad price: {}", path, line_no + 1, e))
        })?;

        ticks.push(FeedTick {
            price,
            cost_signal: parse(fields[1], "cost_signal")?,
            liquidity: parse(fields[2], "liquidity")?,
            volume: parse(fields[3], "volume")?,
        });
    }

    if ticks.is_empty() {
        return Err(KeeperError::FeedError(format!(
            "{}: no ticks in replay file",
            path
        )));
    }

    Ok(ticks)
}
