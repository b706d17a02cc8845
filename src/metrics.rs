use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::session::{Session, SessionId};

/// Successful probes per second over `elapsed`.
///
/// Returns `0.0` until at least `min_elapsed` has passed, so the report taken
/// on the very first tick never divides by (almost) zero.
pub fn actual_frequency(probe_count: u64, elapsed: Duration, min_elapsed: Duration) -> f64 {
    if elapsed.is_zero() || elapsed < min_elapsed {
        return 0.0;
    }
    probe_count as f64 / elapsed.as_secs_f64()
}

/// Snapshot of a session, emitted on every tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub session: SessionId,
    /// Successful probes so far
    pub probes_sent: u64,
    pub actual_frequency_hz: f64,
    pub requested_rate_hz: f64,
    pub failures: u64,
    pub skipped: u64,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl Report {
    pub fn capture(session: &Session, now: Instant, min_elapsed: Duration) -> Self {
        let elapsed = session.elapsed_at(now);
        let probes_sent = session.probe_count();

        Self {
            session: session.id(),
            probes_sent,
            actual_frequency_hz: actual_frequency(probes_sent, elapsed, min_elapsed),
            requested_rate_hz: session.rate_hz(),
            failures: session.failures(),
            skipped: session.skipped(),
            elapsed,
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Packets Sent: {}", self.probes_sent)?;
        write!(f, "Actual Frequency: {:.2} Hz", self.actual_frequency_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUARD: Duration = Duration::from_millis(10);

    #[test]
    fn test_actual_frequency() {
        assert_eq!(actual_frequency(50, Duration::from_secs(5), GUARD), 10.0);
        assert_eq!(actual_frequency(0, Duration::from_secs(5), GUARD), 0.0);
        assert_eq!(actual_frequency(3, Duration::from_millis(1500), GUARD), 2.0);
    }

    #[test]
    fn test_first_tick_is_guarded() {
        assert_eq!(actual_frequency(0, Duration::ZERO, GUARD), 0.0);
        assert_eq!(actual_frequency(1, Duration::from_micros(3), GUARD), 0.0);
        assert_eq!(actual_frequency(1, Duration::ZERO, Duration::ZERO), 0.0);

        let value = actual_frequency(1, Duration::from_micros(3), Duration::ZERO);
        assert!(value.is_finite());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture() {
        let started = Instant::now();
        let session = Session::new(SessionId(1), "192.0.2.1", 10.0, started);
        for _ in 0..50 {
            session.record_success();
        }
        session.record_failure();

        let report = Report::capture(&session, started + Duration::from_secs(5), GUARD);
        assert_eq!(report.session, SessionId(1));
        assert_eq!(report.probes_sent, 50);
        assert_eq!(report.actual_frequency_hz, 10.0);
        assert_eq!(report.requested_rate_hz, 10.0);
        assert_eq!(report.failures, 1);
        assert_eq!(report.elapsed, Duration::from_secs(5));
    }

    #[test]
    fn test_display() {
        let report = Report {
            session: SessionId(1),
            probes_sent: 12,
            actual_frequency_hz: 9.8765,
            requested_rate_hz: 10.0,
            failures: 0,
            skipped: 0,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(
            report.to_string(),
            "Packets Sent: 12\nActual Frequency: 9.88 Hz"
        );
    }

    #[test]
    fn test_json() {
        let report = Report {
            session: SessionId(4),
            probes_sent: 2,
            actual_frequency_hz: 2.0,
            requested_rate_hz: 2.0,
            failures: 1,
            skipped: 0,
            elapsed: Duration::from_secs(1),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["session"], 4);
        assert_eq!(json["probes_sent"], 2);
        assert_eq!(json["elapsed"], "1s");
    }
}
