use std::{
    sync::{atomic::AtomicU64, Arc},
    time::Duration,
};

use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    time::{timeout, Instant},
};
use tracing::{debug, info_span, trace, Instrument};

use crate::{session::Session, OverflowPolicy, ProbeConfig, ProbeError, ProbeTransport};

/// What happened to a tick's probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A probe task was spawned
    Spawned,
    /// `max_in_flight` probes of the session were outstanding and the tick
    /// was dropped
    Skipped,
}

/// Budget of outstanding probes owned by one session.
///
/// Probe tasks keep their permit until they finish, so a superseded
/// session's stragglers only ever drain their own budget.
#[derive(Debug)]
pub(crate) struct ProbeSlots {
    limit: usize,
    semaphore: Arc<Semaphore>,
}

impl ProbeSlots {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
        }
    }

    fn try_take(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore).try_acquire_owned().ok()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.limit.saturating_sub(self.semaphore.available_permits())
    }
}

/// Runs one probe per call on its own task
pub struct ProbeDispatcher<T> {
    transport: Arc<T>,
    timeout: Duration,
    max_in_flight: usize,
    overflow: OverflowPolicy,
    /// Id of the session whose outcomes are still wanted
    active: Arc<AtomicU64>,
}

impl<T: ProbeTransport> ProbeDispatcher<T> {
    pub fn new(config: &ProbeConfig, transport: T, active: Arc<AtomicU64>) -> Self {
        Self {
            transport: Arc::new(transport),
            timeout: config.timeout,
            max_in_flight: config.max_in_flight,
            overflow: config.overflow,
            active,
        }
    }

    /// Fresh probe budget for a new session, `None` for an unbounded dispatcher
    pub(crate) fn slots(&self) -> Option<ProbeSlots> {
        match self.overflow {
            OverflowPolicy::Skip => Some(ProbeSlots::new(self.max_in_flight)),
            OverflowPolicy::Unbounded => None,
        }
    }

    /// Start one probe for `session` without waiting for it
    pub fn dispatch(&self, session: &Arc<Session>) -> Dispatch {
        let permit = match session.slots() {
            Some(slots) => match slots.try_take() {
                Some(permit) => Some(permit),
                None => {
                    let skipped = session.record_skip();
                    debug!(
                        "Session {}: all {} probe slots busy, skipping tick ({} skipped)",
                        session.id(),
                        self.max_in_flight,
                        skipped
                    );
                    return Dispatch::Skipped;
                }
            },
            None => None,
        };

        let seq = session.record_dispatch();
        let transport = Arc::clone(&self.transport);
        let session = Arc::clone(session);
        let active = Arc::clone(&self.active);
        let limit = self.timeout;
        let span = info_span!("probe", session = %session.id(), seq, target = %session.target());

        tokio::spawn(
            async move {
                let _permit = permit;
                let started = Instant::now();

                let result = timeout(limit, transport.probe(session.target()))
                    .await
                    .unwrap_or_else(|elapsed| Err(ProbeError::elapsed(limit, elapsed)));

                if !session.is_current(&active) {
                    trace!("Session is no longer active, discarding probe outcome");
                    return;
                }

                // The session may close between the check above and here
                match result {
                    Ok(()) => match session.record_success() {
                        Some(count) => {
                            trace!("Reply after {:?} ({} so far)", started.elapsed(), count)
                        }
                        None => trace!("Session closed, discarding reply"),
                    },
                    Err(e) => {
                        if session.record_failure().is_some() {
                            debug!("Probe failed ({}): {}", e.kind(), e);
                        } else {
                            trace!("Session closed, discarding failure: {}", e);
                        }
                    }
                }
            }
            .instrument(span),
        );

        Dispatch::Spawned
    }
}
