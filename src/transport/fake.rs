//! Scripted probe transport.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tokio::time::sleep;

use crate::ProbeError;

use super::ProbeTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutcome {
    /// Reply after the configured delay
    Reply,
    /// Report the target unreachable after the configured delay
    Unreachable,
    /// Never answer
    Hang,
}

/// Transport that answers every probe the same way after a fixed delay
#[derive(Debug)]
pub struct FakeTransport {
    outcome: FakeOutcome,
    delay: Duration,
    attempts: AtomicU64,
    completed: AtomicU64,
}

impl FakeTransport {
    pub fn new(outcome: FakeOutcome, delay: Duration) -> Self {
        Self {
            outcome,
            delay,
            attempts: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn replying(delay: Duration) -> Self {
        Self::new(FakeOutcome::Reply, delay)
    }

    pub fn unreachable(delay: Duration) -> Self {
        Self::new(FakeOutcome::Unreachable, delay)
    }

    pub fn hanging() -> Self {
        Self::new(FakeOutcome::Hang, Duration::ZERO)
    }

    /// Probes started so far
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Probes that produced an answer so far
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }
}

impl ProbeTransport for FakeTransport {
    async fn probe(&self, _target: &str) -> Result<(), ProbeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.outcome == FakeOutcome::Hang {
            std::future::pending::<()>().await;
        }

        sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);

        match self.outcome {
            FakeOutcome::Reply => Ok(()),
            _ => Err(ProbeError::Unreachable { status: Some(1) }),
        }
    }
}
