use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch, Mutex,
    },
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

use crate::{
    dispatcher::ProbeDispatcher,
    metrics::Report,
    session::{Session, SessionId, SessionState},
    Config, ConfigValidationError, ProbeTransport, ProberError,
};

/// Background ticker of the running session
struct Scheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    session: Option<Arc<Session>>,
    scheduler: Option<Scheduler>,
}

/// Drives probe sessions at a fixed rate.
///
/// At most one session runs at a time. Every tick dispatches one probe and
/// sends a [`Report`] to the channel returned by [`RateController::new`].
pub struct RateController<T> {
    dispatcher: Arc<ProbeDispatcher<T>>,
    min_report_elapsed: Duration,
    report_tx: mpsc::Sender<Report>,
    /// Last session id handed out
    generation: AtomicU64,
    /// Id of the running session, `SessionId::NONE` when nothing runs
    active: Arc<AtomicU64>,
    inner: Mutex<Inner>,
}

impl<T: ProbeTransport> RateController<T> {
    pub fn new(config: &Config, transport: T) -> (Self, mpsc::Receiver<Report>) {
        let (report_tx, report_rx) = mpsc::channel(config.schedule.report_buffer.max(1));
        let active = Arc::new(AtomicU64::new(SessionId::NONE.get()));
        let dispatcher = ProbeDispatcher::new(&config.probe, transport, Arc::clone(&active));

        let controller = Self {
            dispatcher: Arc::new(dispatcher),
            min_report_elapsed: config.schedule.min_report_elapsed,
            report_tx,
            generation: AtomicU64::new(SessionId::NONE.get()),
            active,
            inner: Mutex::new(Inner::default()),
        };

        (controller, report_rx)
    }

    /// Start probing `target` at `rate_hz` probes per second.
    ///
    /// A running session is stopped first. Invalid arguments leave the
    /// current state untouched.
    pub async fn start(&self, target: &str, rate_hz: f64) -> Result<SessionId, ProberError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(ProberError::config(ConfigValidationError::EmptyTarget));
        }
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(ProberError::config(ConfigValidationError::InvalidRate(
                rate_hz,
            )));
        }

        let mut inner = self.inner.lock().await;

        if let Some(previous) = self.halt(&mut inner).await {
            info!("Session {} superseded by a new start request", previous);
        }

        let id = SessionId(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        let session = Arc::new(
            Session::new(id, target, rate_hz, Instant::now()).with_slots(self.dispatcher.slots()),
        );
        self.active.store(id.get(), Ordering::Release);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(
            run_schedule(
                Arc::clone(&session),
                Arc::clone(&self.dispatcher),
                self.report_tx.clone(),
                self.min_report_elapsed,
                shutdown_rx,
            )
            .instrument(info_span!("session", id = %id)),
        );
        debug!("Spawned scheduler task: {:?}", handle.id());

        info!(
            "Session {} started: probing {} at {} Hz (every {:?})",
            id,
            session.target(),
            rate_hz,
            session.interval()
        );

        inner.scheduler = Some(Scheduler { shutdown, handle });
        inner.session = Some(session);
        inner.state = SessionState::Running;

        Ok(id)
    }

    /// Stop the running session. Calling it with nothing running does nothing.
    ///
    /// Returns once the scheduler task has exited, so no report for the
    /// stopped session is produced afterwards. Probes already in flight finish
    /// on their own and their outcomes are dropped.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Running {
            trace!("Stop requested while {}", inner.state);
            return;
        }

        if let Some(id) = self.halt(&mut inner).await {
            info!("Session {} stopped", id);
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// The running session, if any
    pub async fn session(&self) -> Option<Arc<Session>> {
        self.inner.lock().await.session.clone()
    }

    /// Successful probes of the running session, 0 when nothing runs
    pub async fn probe_count(&self) -> u64 {
        self.session()
            .await
            .map(|session| session.probe_count())
            .unwrap_or(0)
    }

    /// Report for the running session as of now
    pub async fn snapshot(&self) -> Option<Report> {
        self.session()
            .await
            .map(|session| Report::capture(&session, Instant::now(), self.min_report_elapsed))
    }

    /// Probes of the running session currently in flight, when bounded
    pub async fn in_flight(&self) -> Option<usize> {
        self.session().await.and_then(|session| session.in_flight())
    }

    /// Invalidate the running session and wait for its scheduler to exit.
    ///
    /// `inner` is left `Stopped` before the first await, so a caller that
    /// drops the future halfway still sees a consistent controller. The
    /// scheduler then exits on its own once the shutdown sender is dropped.
    async fn halt(&self, inner: &mut Inner) -> Option<SessionId> {
        // Outcomes of probes still in flight are discarded from here on
        self.active.store(SessionId::NONE.get(), Ordering::Release);

        let scheduler = inner.scheduler.take();
        let session = inner.session.take();
        if let Some(session) = &session {
            session.close();
            inner.state = SessionState::Stopped;
        }

        if let Some(scheduler) = scheduler {
            let _ = scheduler.shutdown.send(true);
            if let Err(e) = scheduler.handle.await {
                error!("Scheduler task failed: {}", e);
            }
        }

        let session = session?;
        debug!(
            "Session {} final counts: {} replies, {} failures, {} skipped of {} ticks",
            session.id(),
            session.probe_count(),
            session.failures(),
            session.skipped(),
            session.dispatched() + session.skipped()
        );
        Some(session.id())
    }
}

impl<T> Drop for RateController<T> {
    fn drop(&mut self) {
        self.active.store(SessionId::NONE.get(), Ordering::Release);
        let inner = self.inner.get_mut();
        if let Some(session) = inner.session.take() {
            session.close();
        }
        if let Some(scheduler) = inner.scheduler.take() {
            scheduler.handle.abort();
        }
    }
}

/// Fixed-rate tick loop of one session.
///
/// Ticks fall on `started_at + n * interval`. When the loop falls behind the
/// missed ticks fire back to back instead of shifting the schedule.
async fn run_schedule<T: ProbeTransport>(
    session: Arc<Session>,
    dispatcher: Arc<ProbeDispatcher<T>>,
    report_tx: mpsc::Sender<Report>,
    min_report_elapsed: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(session.started_at(), session.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                debug!("Scheduler received shutdown signal");
                break;
            }

            _ = ticker.tick() => {
                dispatcher.dispatch(&session);

                let report = Report::capture(&session, Instant::now(), min_report_elapsed);
                trace!(
                    "Tick: {} replies, {:.2} Hz",
                    report.probes_sent,
                    report.actual_frequency_hz
                );

                match report_tx.try_send(report) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!("Report channel full, dropping report");
                    }
                    Err(TrySendError::Closed(_)) => {
                        trace!("Report receiver gone");
                    }
                }
            }
        }
    }
}
