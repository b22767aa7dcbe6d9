//! Error types for the keeper service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Feed error: {0}")]
    FeedError(String),

    #[error("Engine error: {0}")]
    EngineError(#[from] riptide_core::EngineError),
}

impl From<std::io::Error> for KeeperError {
    fn from(err: std::io::Error) -> Self {
        KeeperError::FeedError(err.to_string())
    }
}

impl From<toml::de::Error> for KeeperError {
    fn from(err: toml::de::Error) -> Self {
        KeeperError::ParseError(err.to_string())
    }
}

pub type KeeperResult<T> = Result<T, KeeperError>;
