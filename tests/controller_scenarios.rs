use std::{sync::Arc, time::Duration};

use ping_pacer::{
    Config, ConfigValidationError, FakeTransport, OverflowPolicy, ProberError, RateController,
    Report, SessionState,
};
use tokio::{sync::mpsc, time::sleep};

fn drain(reports: &mut mpsc::Receiver<Report>) -> Vec<Report> {
    let mut received = Vec::new();
    while let Ok(report) = reports.try_recv() {
        received.push(report);
    }
    received
}

fn config_with(timeout: Duration, overflow: OverflowPolicy, max_in_flight: usize) -> Config {
    let mut config = Config::default();
    config.probe.timeout = timeout;
    config.probe.overflow = overflow;
    config.probe.max_in_flight = max_in_flight;
    config
}

/// A fast, always answering target reaches the requested rate
#[tokio::test(start_paused = true)]
async fn reachable_target_matches_requested_rate() {
    let transport = Arc::new(FakeTransport::replying(Duration::from_millis(30)));
    let (controller, mut reports) = RateController::new(&Config::default(), Arc::clone(&transport));

    controller.start("192.0.2.1", 10.0).await.unwrap();
    sleep(Duration::from_millis(1050)).await;
    controller.stop().await;

    let received = drain(&mut reports);
    let last = received.last().expect("at least one report");

    assert!(
        (8..=12).contains(&last.probes_sent),
        "probes_sent = {}",
        last.probes_sent
    );
    assert!(
        (8.0..=12.0).contains(&last.actual_frequency_hz),
        "actual frequency = {}",
        last.actual_frequency_hz
    );
    assert_eq!(last.failures, 0);
    assert_eq!(last.skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn empty_target_creates_no_session() {
    let transport = Arc::new(FakeTransport::replying(Duration::from_millis(30)));
    let (controller, mut reports) = RateController::new(&Config::default(), Arc::clone(&transport));

    let err = controller.start("", 10.0).await.unwrap_err();
    assert!(matches!(
        err,
        ProberError::Config(ConfigValidationError::EmptyTarget)
    ));

    sleep(Duration::from_millis(500)).await;
    assert_eq!(controller.state().await, SessionState::Idle);
    assert!(controller.session().await.is_none());
    assert_eq!(controller.probe_count().await, 0);
    assert!(drain(&mut reports).is_empty());
    assert_eq!(transport.attempts(), 0);
}

/// Probes that always time out leave the count at zero while ticks keep coming
#[tokio::test(start_paused = true)]
async fn unresponsive_target_keeps_ticking() {
    let transport = Arc::new(FakeTransport::hanging());
    let (controller, mut reports) = RateController::new(&Config::default(), Arc::clone(&transport));

    controller.start("192.0.2.1", 10.0).await.unwrap();
    sleep(Duration::from_millis(2050)).await;
    controller.stop().await;

    let received = drain(&mut reports);
    assert_eq!(received.len(), 21);
    assert!(received.iter().all(|report| report.probes_sent == 0));
    assert!(received
        .iter()
        .all(|report| report.actual_frequency_hz == 0.0));

    let last = received.last().unwrap();
    // Probes dispatched before 1800 ms have hit the 200 ms timeout, the one
    // from 1800 ms times out on the same instant as the last tick
    assert!((18..=19).contains(&last.failures), "failures = {}", last.failures);
    assert_eq!(last.skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn no_reports_after_stop() {
    let transport = Arc::new(FakeTransport::replying(Duration::from_millis(30)));
    let (controller, mut reports) = RateController::new(&Config::default(), Arc::clone(&transport));

    controller.start("192.0.2.1", 20.0).await.unwrap();
    sleep(Duration::from_millis(500)).await;
    controller.stop().await;

    let before = drain(&mut reports);
    assert!(!before.is_empty());
    let attempts = transport.attempts();

    sleep(Duration::from_secs(2)).await;
    assert!(drain(&mut reports).is_empty());
    assert_eq!(transport.attempts(), attempts);
    assert_eq!(controller.state().await, SessionState::Stopped);
}

/// Replies arriving after a restart never count towards the new session
#[tokio::test(start_paused = true)]
async fn late_replies_do_not_leak_into_restarted_session() {
    let config = config_with(Duration::from_secs(2), OverflowPolicy::Skip, 16);
    let transport = Arc::new(FakeTransport::replying(Duration::from_millis(500)));
    let (controller, _reports) = RateController::new(&config, Arc::clone(&transport));

    // Ticks at 0 and 100 ms, replies due at 500 and 600 ms
    controller.start("192.0.2.1", 10.0).await.unwrap();
    sleep(Duration::from_millis(150)).await;
    let old = controller.session().await.unwrap();

    let new_id = controller.start("192.0.2.1", 10.0).await.unwrap();
    assert_ne!(old.id(), new_id);

    // The new session's first reply is due at 650 ms
    sleep(Duration::from_millis(490)).await;
    assert!(transport.completed() >= 2);
    assert_eq!(controller.probe_count().await, 0);
    assert_eq!(old.probe_count(), 0);

    sleep(Duration::from_millis(60)).await;
    assert_eq!(controller.probe_count().await, 1);
    assert_eq!(old.probe_count(), 0);
    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn late_replies_after_stop_are_discarded() {
    let config = config_with(Duration::from_secs(2), OverflowPolicy::Skip, 16);
    let transport = Arc::new(FakeTransport::replying(Duration::from_millis(500)));
    let (controller, _reports) = RateController::new(&config, Arc::clone(&transport));

    controller.start("192.0.2.1", 10.0).await.unwrap();
    sleep(Duration::from_millis(150)).await;
    let session = controller.session().await.unwrap();
    controller.stop().await;

    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.completed(), 2);
    assert_eq!(session.probe_count(), 0);
    assert_eq!(session.failures(), 0);
    assert_eq!(controller.probe_count().await, 0);
}

/// Slow probes do not push the schedule back
#[tokio::test(start_paused = true)]
async fn slow_probes_do_not_delay_ticks() {
    let config = config_with(Duration::from_secs(1), OverflowPolicy::Unbounded, 1);
    let transport = Arc::new(FakeTransport::replying(Duration::from_millis(250)));
    let (controller, mut reports) = RateController::new(&config, Arc::clone(&transport));

    controller.start("192.0.2.1", 10.0).await.unwrap();
    sleep(Duration::from_millis(1050)).await;
    controller.stop().await;

    let received = drain(&mut reports);
    assert_eq!(received.len(), 11);

    for (n, report) in received.iter().enumerate() {
        assert_eq!(report.elapsed, Duration::from_millis(100 * n as u64));
    }

    // Ticks 0..=700 ms have answered by the 1000 ms tick
    let last = received.last().unwrap();
    assert_eq!(last.probes_sent, 8);
    assert_eq!(last.skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn busy_slots_skip_ticks() {
    let config = config_with(Duration::from_secs(1), OverflowPolicy::Skip, 1);
    let transport = Arc::new(FakeTransport::replying(Duration::from_millis(250)));
    let (controller, _reports) = RateController::new(&config, Arc::clone(&transport));

    controller.start("192.0.2.1", 10.0).await.unwrap();
    sleep(Duration::from_millis(1050)).await;

    // Probes start at 0, 300, 600 and 900 ms, every other tick is skipped
    let session = controller.session().await.unwrap();
    assert_eq!(session.dispatched(), 4);
    assert_eq!(session.skipped(), 7);
    assert_eq!(controller.in_flight().await, Some(1));
    assert_eq!(transport.attempts(), 4);

    controller.stop().await;
}

/// Outstanding pings of a superseded session never eat into the new session's slots
#[tokio::test(start_paused = true)]
async fn restart_with_busy_slots_starts_with_a_full_budget() {
    let config = config_with(Duration::from_secs(2), OverflowPolicy::Skip, 2);
    let transport = Arc::new(FakeTransport::replying(Duration::from_millis(500)));
    let (controller, _reports) = RateController::new(&config, Arc::clone(&transport));

    // Ticks at 0 and 100 ms fill both slots until 500 and 600 ms
    controller.start("192.0.2.1", 10.0).await.unwrap();
    sleep(Duration::from_millis(150)).await;
    let old = controller.session().await.unwrap();
    assert_eq!(old.in_flight(), Some(2));

    // New ticks at 150 and 250 ms
    controller.start("192.0.2.1", 10.0).await.unwrap();
    sleep(Duration::from_millis(120)).await;

    let session = controller.session().await.unwrap();
    assert_eq!(session.dispatched(), 2);
    assert_eq!(session.skipped(), 0);
    assert_eq!(controller.in_flight().await, Some(2));
    assert_eq!(old.in_flight(), Some(2));

    // Replies due at 650 and 750 ms
    sleep(Duration::from_millis(500)).await;
    assert_eq!(controller.probe_count().await, 2);
    assert_eq!(old.probe_count(), 0);
    assert_eq!(old.in_flight(), Some(0));

    controller.stop().await;
}
