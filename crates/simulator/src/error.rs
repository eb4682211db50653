//! Error types for the scenario simulator

use thiserror::Error;
use tranche_core::TrancheError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Pool error: {0}")]
    Pool(#[from] TrancheError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SimError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SimError::InvalidScenario(reason.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
