//! Scheduling, isolation and shutdown behavior of the poller.

use std::sync::Arc;
use std::time::Duration;

use health_bridge::config::PollerConfig;
use health_bridge::health::{
    BlockingSource, Health, HealthSource, HealthSourceId, HealthStatus, Poller, SnapshotCache,
};
use tokio::time::{sleep, Instant};

mod common;
use common::{register, Behavior, ConcurrencyTracker, ScriptedSource};

fn config(period_secs: u64, pool_size: usize) -> PollerConfig {
    PollerConfig {
        period_secs,
        pool_size,
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_source_cached_after_one_period() {
    let sources: Vec<_> = ["db", "cache", "queue", "search"]
        .iter()
        .map(|id| (*id, ScriptedSource::new(Behavior::Status(HealthStatus::Up))))
        .collect();

    let cache = SnapshotCache::new();
    let poller = Poller::new(
        &config(10, 5),
        cache.clone(),
        sources.iter().map(|(id, s)| register(id, s)).collect(),
    )
    .unwrap();

    poller.start().unwrap();
    sleep(Duration::from_secs(10)).await;

    for (id, _) in &sources {
        let snapshot = cache.get(id).expect("snapshot recorded");
        assert_eq!(snapshot.status, HealthStatus::Up);
    }
    assert_eq!(cache.len(), sources.len());

    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_source_does_not_stop_polling() {
    let healthy = ScriptedSource::new(Behavior::Status(HealthStatus::Up));
    let failing = ScriptedSource::new(Behavior::Fail);

    let cache = SnapshotCache::new();
    let poller = Poller::new(
        &config(1, 2),
        cache.clone(),
        vec![register("db", &healthy), register("queue", &failing)],
    )
    .unwrap();

    poller.start().unwrap();
    sleep(Duration::from_millis(3500)).await;

    assert!(healthy.calls() >= 3, "healthy source polled {} times", healthy.calls());
    assert!(failing.calls() >= 3, "failing source polled {} times", failing.calls());

    let queue = cache.get("queue").unwrap();
    assert_eq!(queue.status, HealthStatus::Unknown);
    assert_eq!(queue.details["failure"], "error");
    assert!(queue.details["error"]
        .as_str()
        .unwrap()
        .contains("connection pool exhausted"));
    assert_eq!(cache.get("db").unwrap().status, HealthStatus::Up);

    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_panicking_source_is_isolated() {
    let healthy = ScriptedSource::new(Behavior::Status(HealthStatus::Down));
    let panicking = ScriptedSource::new(Behavior::Panic);

    let cache = SnapshotCache::new();
    let poller = Poller::new(
        &config(1, 1),
        cache.clone(),
        vec![register("db", &healthy), register("flaky", &panicking)],
    )
    .unwrap();

    poller.start().unwrap();
    sleep(Duration::from_millis(2500)).await;

    assert!(panicking.calls() >= 2);
    assert!(healthy.calls() >= 2);
    assert_eq!(cache.get("flaky").unwrap().details["failure"], "panic");
    assert_eq!(cache.get("db").unwrap().status, HealthStatus::Down);

    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_source_times_out_and_is_not_restarted_while_running() {
    let fast = ScriptedSource::new(Behavior::Status(HealthStatus::Up));
    let slow = ScriptedSource::new(Behavior::Slow(Duration::from_millis(2500)));

    let cache = SnapshotCache::new();
    let poller = Poller::new(
        &config(1, 2),
        cache.clone(),
        vec![register("fast", &fast), register("slow", &slow)],
    )
    .unwrap();

    poller.start().unwrap();
    sleep(Duration::from_millis(1500)).await;

    let snapshot = cache.get("slow").unwrap();
    assert_eq!(snapshot.status, HealthStatus::Unknown);
    assert_eq!(snapshot.details["failure"], "timeout");

    // The next run waits on the evaluation still in flight, which lands at 2.5s
    sleep(Duration::from_millis(1700)).await;
    assert_eq!(slow.calls(), 1);
    assert_eq!(cache.get("slow").unwrap().status, HealthStatus::Up);
    assert!(fast.calls() >= 3, "fast source polled {} times", fast.calls());

    poller.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timed_out_blocking_sources_keep_their_pool_slot() {
    let tracker = Arc::new(ConcurrencyTracker::default());
    let blocking = |tracker: Arc<ConcurrencyTracker>| {
        Arc::new(BlockingSource::new(move || {
            tracker.enter();
            std::thread::sleep(Duration::from_millis(1500));
            tracker.exit();
            Ok(Health::up())
        })) as Arc<dyn HealthSource>
    };

    let cache = SnapshotCache::new();
    let poller = Poller::new(
        &config(1, 1),
        cache.clone(),
        vec![
            (HealthSourceId::from("ledger"), blocking(tracker.clone())),
            (HealthSourceId::from("archive"), blocking(tracker.clone())),
        ],
    )
    .unwrap();

    poller.start().unwrap();
    sleep(Duration::from_millis(3500)).await;
    poller.stop().await;

    assert_eq!(tracker.max(), 1);
    for id in ["ledger", "archive"] {
        let snapshot = cache.get(id).expect("snapshot recorded");
        assert_eq!(snapshot.status, HealthStatus::Unknown);
        assert_eq!(snapshot.details["failure"], "timeout");
    }
}

#[tokio::test(start_paused = true)]
async fn test_pool_size_bounds_concurrent_evaluations() {
    let tracker = Arc::new(ConcurrencyTracker::default());
    let sources: Vec<_> = (0..6)
        .map(|i| {
            (
                format!("source-{}", i),
                ScriptedSource::tracked(Behavior::Slow(Duration::from_millis(200)), tracker.clone()),
            )
        })
        .collect();

    let cache = SnapshotCache::new();
    let poller = Poller::new(
        &config(1, 2),
        cache.clone(),
        sources.iter().map(|(id, s)| register(id, s)).collect(),
    )
    .unwrap();

    poller.start().unwrap();
    sleep(Duration::from_secs(3)).await;
    poller.stop().await;

    assert_eq!(tracker.max(), 2);
    // Queued sources are delayed, not dropped
    assert_eq!(cache.len(), 6);
    for (_, source) in &sources {
        assert!(source.calls() >= 2);
    }
}

#[tokio::test(start_paused = true)]
async fn test_next_run_is_scheduled_after_completion() {
    let source = ScriptedSource::new(Behavior::Slow(Duration::from_millis(300)));

    let poller = Poller::new(
        &config(1, 1),
        SnapshotCache::new(),
        vec![register("db", &source)],
    )
    .unwrap();

    poller.start().unwrap();
    sleep(Duration::from_secs(3)).await;
    poller.stop().await;

    let started = source.started();
    assert!(started.len() >= 2);
    for pair in started.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(1300));
    }
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_updates() {
    let up = ScriptedSource::new(Behavior::Status(HealthStatus::Up));
    let failing = ScriptedSource::new(Behavior::Fail);

    let cache = SnapshotCache::new();
    let poller = Poller::new(
        &config(1, 2),
        cache.clone(),
        vec![register("db", &up), register("queue", &failing)],
    )
    .unwrap();

    poller.start().unwrap();
    sleep(Duration::from_millis(1500)).await;
    poller.stop().await;
    assert!(!poller.is_running());

    let snapshot = |cache: &SnapshotCache| {
        let mut entries: Vec<_> = cache
            .entries()
            .into_iter()
            .map(|(id, s)| (id, (*s).clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    };
    let at_stop = snapshot(&cache);
    let calls_at_stop = (up.calls(), failing.calls());

    sleep(Duration::from_secs(2)).await;

    assert_eq!(snapshot(&cache), at_stop);
    assert_eq!((up.calls(), failing.calls()), calls_at_stop);
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_evaluation() {
    let slow = ScriptedSource::new(Behavior::Slow(Duration::from_millis(500)));

    let cache = SnapshotCache::new();
    let poller = Poller::new(&config(1, 1), cache.clone(), vec![register("db", &slow)]).unwrap();

    poller.start().unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(slow.calls(), 1);

    let stop_started = Instant::now();
    poller.stop().await;
    assert!(stop_started.elapsed() < Duration::from_millis(500));

    sleep(Duration::from_secs(2)).await;
    assert!(cache.get("db").is_none());
}
