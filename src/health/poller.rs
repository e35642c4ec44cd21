//! Periodic health polling.
//!
//! # Responsibilities
//! - Evaluate every registered source on a fixed-delay schedule
//! - Bound concurrent evaluations with a fixed-size worker pool
//! - Record a snapshot per evaluation, successful or not
//! - Start/stop lifecycle with bounded shutdown
//!
//! # Design Decisions
//! - One task per source; a permit from the shared pool is held only while
//!   the source is being evaluated, so excess sources queue instead of failing
//! - A timed-out evaluation keeps its permit until the source actually
//!   returns (blocking sources cannot be cancelled). Its next run waits on
//!   that same evaluation rather than starting a second one
//! - Each evaluation runs in its own task: a panic is caught and recorded
//!   like any other failure
//! - An evaluation is bounded by the poll period; exceeding it is a failure
//! - Failures write an UNKNOWN snapshot with the error in its details
//! - The next run is scheduled one period after the previous one completes

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;

use crate::config::PollerConfig;
use crate::error::{PollerError, ProbeError};
use crate::health::cache::{Snapshot, SnapshotCache};
use crate::health::source::{HealthSource, HealthSourceId};
use crate::health::status::{Health, HealthStatus};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::observability::metrics;

/// Upper bound on how long `stop` waits for source tasks before aborting them.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Why an evaluation produced no status.
#[derive(Debug)]
enum ProbeFailure {
    Error(ProbeError),
    Timeout(Duration),
    Panic(String),
}

impl ProbeFailure {
    fn kind(&self) -> &'static str {
        match self {
            ProbeFailure::Error(_) => "error",
            ProbeFailure::Timeout(_) => "timeout",
            ProbeFailure::Panic(_) => "panic",
        }
    }

    fn message(&self) -> String {
        match self {
            ProbeFailure::Error(e) => e.to_string(),
            ProbeFailure::Timeout(limit) => {
                format!("health check timed out after {}ms", limit.as_millis())
            }
            ProbeFailure::Panic(msg) => format!("health check panicked: {}", msg),
        }
    }

    fn into_health(self) -> Health {
        let kind = self.kind();
        Health::unknown()
            .with_detail("error", self.message())
            .with_detail("failure", kind)
    }
}

/// Handle to a source evaluation running in its own task.
type Evaluation = JoinHandle<Result<Health, ProbeError>>;

/// Evaluate `source` once, bounded by `timeout`, and build its snapshot.
///
/// Never fails: errors, timeouts and panics yield an UNKNOWN snapshot.
pub async fn probe_once(
    id: &HealthSourceId,
    source: Arc<dyn HealthSource>,
    timeout: Duration,
) -> Snapshot {
    let started = Instant::now();
    let mut task = spawn_evaluation(source, None);
    let result = settle(&mut task, timeout).await;
    // Nobody waits on a timed-out evaluation here
    task.abort();
    into_snapshot(id, started, result)
}

/// Run `source` in its own task. `permit` is released when the source
/// returns, not when the caller stops waiting.
fn spawn_evaluation(
    source: Arc<dyn HealthSource>,
    permit: Option<OwnedSemaphorePermit>,
) -> Evaluation {
    tokio::spawn(async move {
        let _permit = permit;
        source.health().await
    })
}

/// Wait up to `timeout` for `task`. On timeout the task keeps running.
async fn settle(task: &mut Evaluation, timeout: Duration) -> Result<Health, ProbeFailure> {
    match time::timeout(timeout, task).await {
        Ok(Ok(Ok(health))) => Ok(health),
        Ok(Ok(Err(e))) => Err(ProbeFailure::Error(e)),
        Ok(Err(join_err)) => Err(ProbeFailure::Panic(join_err.to_string())),
        Err(_) => Err(ProbeFailure::Timeout(timeout)),
    }
}

fn into_snapshot(
    id: &HealthSourceId,
    started: Instant,
    result: Result<Health, ProbeFailure>,
) -> Snapshot {
    metrics::record_probe_duration(id.as_str(), started.elapsed());

    let health = match result {
        Ok(health) => {
            metrics::record_probe(id.as_str(), "ok");
            tracing::debug!(source = %id, status = %health.status, "Health check completed");
            health
        }
        Err(failure) => {
            metrics::record_probe(id.as_str(), failure.kind());
            tracing::warn!(
                source = %id,
                failure = failure.kind(),
                error = %failure.message(),
                "Health check failed, recording UNKNOWN"
            );
            failure.into_health()
        }
    };

    Snapshot::new(id.clone(), health, Utc::now())
}

/// State shared by all source tasks.
struct PollContext {
    cache: SnapshotCache,
    permits: Arc<Semaphore>,
    period: Duration,
}

struct Running {
    shutdown: Shutdown,
    tasks: JoinSet<()>,
}

/// Drives periodic evaluation of a fixed set of health sources.
pub struct Poller {
    sources: Vec<(HealthSourceId, Arc<dyn HealthSource>)>,
    cache: SnapshotCache,
    period: Duration,
    pool_size: usize,
    running: Mutex<Option<Running>>,
}

impl Poller {
    /// Create a poller over `sources`, writing into `cache`.
    ///
    /// Source ids must be unique.
    pub fn new(
        config: &PollerConfig,
        cache: SnapshotCache,
        sources: Vec<(HealthSourceId, Arc<dyn HealthSource>)>,
    ) -> Result<Self, PollerError> {
        if config.pool_size == 0 {
            return Err(PollerError::EmptyPool);
        }
        if config.period_secs == 0 {
            return Err(PollerError::ZeroPeriod);
        }

        let mut seen = std::collections::HashSet::new();
        for (id, _) in &sources {
            if !seen.insert(id.as_str()) {
                return Err(PollerError::DuplicateSource(id.to_string()));
            }
        }

        Ok(Self {
            sources,
            cache,
            period: config.period(),
            pool_size: config.pool_size,
            running: Mutex::new(None),
        })
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Spawn one polling task per source. Each source is evaluated right
    /// away and then once per period. Must be called within a Tokio runtime.
    pub fn start(&self) -> Result<(), PollerError> {
        let mut running = self.lock_running();
        if running.is_some() {
            return Err(PollerError::AlreadyRunning);
        }

        let ctx = Arc::new(PollContext {
            cache: self.cache.clone(),
            permits: Arc::new(Semaphore::new(self.pool_size)),
            period: self.period,
        });
        let shutdown = Shutdown::new();
        let mut tasks = JoinSet::new();

        for (id, source) in &self.sources {
            tasks.spawn(poll_source(
                ctx.clone(),
                id.clone(),
                source.clone(),
                shutdown.subscribe(),
            ));
        }

        tracing::info!(
            sources = self.sources.len(),
            pool_size = self.pool_size,
            period_secs = self.period.as_secs(),
            "Health poller started"
        );

        *running = Some(Running { shutdown, tasks });
        Ok(())
    }

    /// Cancel all scheduled evaluations and wait for source tasks to exit.
    ///
    /// Evaluations already in flight are left to finish in the background,
    /// holding their pool permits; their results are discarded. Once this returns the cache receives no
    /// further writes from this poller. Calling `stop` on a stopped poller
    /// is a no-op.
    pub async fn stop(&self) {
        let running = self.lock_running().take();
        let Some(Running { shutdown, mut tasks }) = running else {
            return;
        };

        tracing::debug!(
            listening = shutdown.receiver_count(),
            "Signalling health poller tasks"
        );
        shutdown.trigger();
        let drained = time::timeout(STOP_TIMEOUT, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = tasks.len(),
                "Health poller tasks did not stop in time, aborting"
            );
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        tracing::info!("Health poller stopped");
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Dropping a running poller aborts its tasks (via `JoinSet`'s drop).
impl Drop for Poller {
    fn drop(&mut self) {
        let running = self
            .running
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(running) = running {
            running.shutdown.trigger();
        }
    }
}

/// Polling loop for one source.
async fn poll_source(
    ctx: Arc<PollContext>,
    id: HealthSourceId,
    source: Arc<dyn HealthSource>,
    mut shutdown: ShutdownSignal,
) {
    let mut in_flight = None;
    loop {
        let snapshot = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            snapshot = evaluate(&ctx, &id, &source, &mut in_flight) => match snapshot {
                Some(snapshot) => snapshot,
                None => break,
            },
        };

        record(&ctx.cache, snapshot);

        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            _ = time::sleep(ctx.period) => {}
        }
    }

    tracing::debug!(source = %id, "Polling task exiting");
}

/// Evaluate `source` under a pool permit, resuming `in_flight` if the
/// previous evaluation is still running. `None` if the pool was closed.
async fn evaluate(
    ctx: &PollContext,
    id: &HealthSourceId,
    source: &Arc<dyn HealthSource>,
    in_flight: &mut Option<Evaluation>,
) -> Option<Snapshot> {
    let mut task = match in_flight.take() {
        Some(task) if !task.is_finished() => task,
        _ => {
            let permit = ctx.permits.clone().acquire_owned().await.ok()?;
            spawn_evaluation(source.clone(), Some(permit))
        }
    };

    let started = Instant::now();
    let result = settle(&mut task, ctx.period).await;
    if !task.is_finished() {
        *in_flight = Some(task);
    }
    Some(into_snapshot(id, started, result))
}

fn record(cache: &SnapshotCache, snapshot: Snapshot) {
    let previous = cache.get(snapshot.id.as_str()).map(|s| s.status);
    if let Some(previous) = previous.filter(|p| *p != snapshot.status) {
        tracing::info!(
            source = %snapshot.id,
            from = %previous,
            to = %snapshot.status,
            "Health status changed"
        );
    } else if previous.is_none() && snapshot.status != HealthStatus::Up {
        tracing::info!(source = %snapshot.id, status = %snapshot.status, "Initial health status");
    }

    cache.put(snapshot);
    metrics::record_cache_size(cache.len());
}
