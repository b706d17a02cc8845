use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigValidationError {
    #[error("Target address must not be empty")]
    EmptyTarget,

    #[error("Rate must be a positive number of probes per second, got {0}")]
    InvalidRate(f64),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConfigValidationError {
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config(details.into())
    }
}
