use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use serde::Serialize;
use tokio::time::Instant;

use crate::dispatcher::ProbeSlots;

/// Set on the outcome counters of a closed session
const CLOSED: u64 = 1 << 63;

/// Generation number of a session. Ids are handed out in increasing order
/// and `0` never names a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    /// Held by the controller while no session runs
    pub const NONE: SessionId = SessionId(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Time between two ticks for the requested rate, rounded to the nearest
/// millisecond and never shorter than one.
pub fn interval_for_rate(rate_hz: f64) -> Duration {
    let millis = (1000.0 / rate_hz).round().max(1.0);
    Duration::from_millis(millis as u64)
}

/// One configured run of the prober
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    target: String,
    rate_hz: f64,
    interval: Duration,
    started_at: Instant,
    /// Successful probes
    probe_count: AtomicU64,
    failures: AtomicU64,
    dispatched: AtomicU64,
    skipped: AtomicU64,
    /// Outstanding probe budget, `None` when unbounded
    slots: Option<ProbeSlots>,
}

impl Session {
    pub(crate) fn new(id: SessionId, target: &str, rate_hz: f64, started_at: Instant) -> Self {
        Self {
            id,
            target: target.to_string(),
            rate_hz,
            interval: interval_for_rate(rate_hz),
            started_at,
            probe_count: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            slots: None,
        }
    }

    pub(crate) fn with_slots(mut self, slots: Option<ProbeSlots>) -> Self {
        self.slots = slots;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Whether this session is the one the controller currently runs
    pub fn is_current(&self, active: &AtomicU64) -> bool {
        active.load(Ordering::Acquire) == self.id.0
    }

    /// Refuse every outcome recorded from now on
    pub(crate) fn close(&self) {
        self.probe_count.fetch_or(CLOSED, Ordering::AcqRel);
        self.failures.fetch_or(CLOSED, Ordering::AcqRel);
    }

    pub fn is_closed(&self) -> bool {
        self.probe_count.load(Ordering::Acquire) & CLOSED != 0
    }

    pub(crate) fn slots(&self) -> Option<&ProbeSlots> {
        self.slots.as_ref()
    }

    /// Probes of this session still outstanding, when its budget is bounded
    pub fn in_flight(&self) -> Option<usize> {
        self.slots.as_ref().map(ProbeSlots::in_flight)
    }

    pub fn probe_count(&self) -> u64 {
        self.probe_count.load(Ordering::Relaxed) & !CLOSED
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed) & !CLOSED
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Count a reply. `None` once the session is closed.
    pub(crate) fn record_success(&self) -> Option<u64> {
        bump_open(&self.probe_count)
    }

    pub(crate) fn record_failure(&self) -> Option<u64> {
        bump_open(&self.failures)
    }

    /// Returns the sequence number of the dispatched probe, starting at 1
    pub(crate) fn record_dispatch(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_skip(&self) -> u64 {
        self.skipped.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Increment `counter` unless it carries the closed bit, in one compare step
fn bump_open(counter: &AtomicU64) -> Option<u64> {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |value| {
            (value & CLOSED == 0).then_some(value + 1)
        })
        .ok()
        .map(|previous| previous + 1)
}
