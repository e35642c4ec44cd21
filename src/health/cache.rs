//! Latest-snapshot cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::health::source::HealthSourceId;
use crate::health::status::{Health, HealthStatus};

/// One evaluation of a health source. Immutable; superseded by the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: HealthSourceId,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
    pub evaluated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(id: HealthSourceId, health: Health, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: health.status,
            details: health.details,
            evaluated_at,
        }
    }
}

/// Concurrent map of source id to its most recent snapshot.
///
/// Cloning is cheap and shares the underlying map. Entries are replaced,
/// never removed.
#[derive(Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<DashMap<HealthSourceId, Arc<Snapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for the snapshot's id. Last write wins.
    pub fn put(&self, snapshot: Snapshot) {
        self.inner.insert(snapshot.id.clone(), Arc::new(snapshot));
    }

    pub fn get(&self, id: &str) -> Option<Arc<Snapshot>> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// Point-in-time view of every entry. Entries are read shard by shard,
    /// so the view is not atomic across ids.
    pub fn entries(&self) -> Vec<(HealthSourceId, Arc<Snapshot>)> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("entries", &self.inner.len())
            .finish()
    }
}
