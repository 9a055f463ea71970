//! Bot error types
use chorus_core::ChorusError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Session error: {0}")]
    Session(#[from] ChorusError),
}

impl From<config::ConfigError> for BotError {
    fn from(err: config::ConfigError) -> Self {
        BotError::Config(err.to_string())
    }
}

impl From<BotError> for ChorusError {
    fn from(err: BotError) -> Self {
        match err {
            BotError::Config(msg) => ChorusError::Config(msg),
            BotError::Session(inner) => inner,
            other => ChorusError::Transport(other.to_string()),
        }
    }
}
