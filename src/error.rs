//! Error types for Lakshya

use thiserror::Error;

/// Lakshya error type
#[derive(Error, Debug)]
pub enum LakshyaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Actuator error: {0}")]
    Actuator(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Thread error: {0}")]
    Thread(String),
}

impl From<toml::de::Error> for LakshyaError {
    fn from(e: toml::de::Error) -> Self {
        LakshyaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LakshyaError>;
