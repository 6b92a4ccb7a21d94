use thiserror::Error;

use crate::chat::history::StoreError;
use crate::chat::ChatError;
use crate::llm::LlmError;

/// Startup and CLI failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Command not supported here: {0}")]
    UnsupportedCommand(&'static str),
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),
    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
