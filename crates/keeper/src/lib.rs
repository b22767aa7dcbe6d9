pub mod config;
pub mod error;
pub mod feed;
pub mod runner;

pub use config::{create_example_config, FeedConfig, FeedMode, KeeperConfig, PoolConfig};
pub use error::{KeeperError, KeeperResult};
pub use feed::{FeedTick, PriceFeed};
pub use runner::Runner;
