use thiserror::Error;

use super::{ConfigValidationError, InitializationError};

#[derive(Error, Debug)]
pub enum ProberError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigValidationError),

    #[error("Initialization error: {0}")]
    Init(#[from] InitializationError),
}

impl ProberError {
    pub fn config(kind: ConfigValidationError) -> Self {
        ProberError::Config(kind)
    }
}

impl From<config::ConfigError> for ProberError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(ConfigValidationError::config(err.to_string()))
    }
}
