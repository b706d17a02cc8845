use std::time::Duration;
use thiserror::Error;
use tokio::time::error::Elapsed;

use super::ProbeFailureKind;

/// Outcome of a single failed probe attempt.
///
/// None of these escape the dispatcher: they are logged and counted as a
/// missed probe.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("No reply within {limit:?}")]
    Timeout {
        limit: Duration,
        #[source]
        source: Option<Elapsed>,
    },

    #[error("Target unreachable (exit status {})", describe_status(.status))]
    Unreachable { status: Option<i32> },

    #[error("Probe program {program} could not be launched")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while waiting for probe: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    pub fn elapsed(limit: Duration, source: Elapsed) -> Self {
        ProbeError::Timeout {
            limit,
            source: Some(source),
        }
    }

    pub fn unavailable(program: impl Into<String>, source: std::io::Error) -> Self {
        ProbeError::Unavailable {
            program: program.into(),
            source,
        }
    }

    pub fn kind(&self) -> ProbeFailureKind {
        match self {
            Self::Timeout { .. } => ProbeFailureKind::Timeout,
            Self::Unreachable { .. } => ProbeFailureKind::Unreachable,
            Self::Unavailable { .. } => ProbeFailureKind::TransportUnavailable,
            Self::Io(_) => ProbeFailureKind::Transport,
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "none".to_string())
}
