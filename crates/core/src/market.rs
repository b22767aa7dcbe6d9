//! # Market Data Types
//!
//! Value types at the oracle boundary. Each signal arrives as a
//! timestamped numeric reading; a snapshot bundles the readings one
//! pool needs for fee composition and is replaced wholesale on refresh.
//! Staleness policy belongs to the caller, not the engine.

/// One oracle reading: a value and the time it was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalReading {
    /// Signal value in its native scale
    pub value: u64,
    /// Timestamp of the reading (unix seconds)
    pub updated_at: i64,
}

/// Market signals for a single pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketSnapshot {
    /// Market volatility (basis points)
    pub volatility_bps: u64,
    /// Available liquidity (token units)
    pub liquidity: u128,
    /// Traded volume over the reporting window (token units)
    pub volume: u128,
    /// Snapshot timestamp (unix seconds)
    pub as_of: i64,
}

impl MarketSnapshot {
    pub fn new(volatility_bps: u64, liquidity: u128, volume: u128, as_of: i64) -> Self {
        Self {
            volatility_bps,
            liquidity,
            volume,
            as_of,
        }
    }

    /// Assemble a snapshot from individual oracle readings, stamped with
    /// the oldest reading so staleness checks upstream see the worst case
    pub fn from_readings(
        volatility: SignalReading,
        liquidity: SignalReading,
        volume: SignalReading,
    ) -> Self {
        Self {
            volatility_bps: volatility.value,
            liquidity: liquidity.value as u128,
            volume: volume.value as u128,
            as_of: volatility
                .updated_at
                .min(liquidity.updated_at)
                .min(volume.updated_at),
        }
    }
}
