//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use health_bridge::error::ProbeError;
use health_bridge::health::{Health, HealthSource, HealthSourceId, HealthStatus};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

/// What a scripted source does on every call.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Status(HealthStatus),
    Fail,
    Panic,
    /// Sleep, then report UP.
    Slow(Duration),
}

/// Tracks how many evaluations run at once across several sources.
#[derive(Debug, Default)]
pub struct ConcurrencyTracker {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl ConcurrencyTracker {
    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }

    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A health source driven by a fixed behavior, recording its calls.
pub struct ScriptedSource {
    behavior: Behavior,
    calls: AtomicUsize,
    started: Mutex<Vec<Instant>>,
    tracker: Option<Arc<ConcurrencyTracker>>,
}

impl ScriptedSource {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
            tracker: None,
        })
    }

    pub fn tracked(behavior: Behavior, tracker: Arc<ConcurrencyTracker>) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            started: Mutex::new(Vec::new()),
            tracker: Some(tracker),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Instants at which each evaluation started.
    pub fn started(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl HealthSource for ScriptedSource {
    async fn health(&self) -> Result<Health, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().push(Instant::now());

        if let Some(tracker) = &self.tracker {
            tracker.enter();
        }
        let result = match self.behavior {
            Behavior::Status(status) => Ok(Health::new(status)),
            Behavior::Fail => Err(ProbeError::Failed("connection pool exhausted".into())),
            Behavior::Panic => panic!("scripted panic"),
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Health::up())
            }
        };
        if let Some(tracker) = &self.tracker {
            tracker.exit();
        }
        result
    }
}

/// Pair a source with its id in the form `Poller::new` expects.
pub fn register(
    id: &str,
    source: &Arc<ScriptedSource>,
) -> (HealthSourceId, Arc<dyn HealthSource>) {
    (HealthSourceId::from(id), source.clone() as Arc<dyn HealthSource>)
}

/// Start a mock HTTP backend answering every request with the current
/// value of `status`. Returns the bound address.
pub async fn start_programmable_backend(status: Arc<AtomicU16>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let status = status.load(Ordering::SeqCst);
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let status_text = match status {
                            200 => "200 OK",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let body = "ok";
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
