use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::worker::{Worker, WorkerId};

/// Point-in-time view of the worker fleet.
///
/// Never mutated after capture: a refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    /// Workers that were running when the snapshot was taken.
    pub workers: Vec<Worker>,
    /// The configured repository-scan worker, when configured and found.
    pub default_worker: Option<Worker>,
    pub captured_at: DateTime<Utc>,
}

impl FleetSnapshot {
    pub fn new(workers: Vec<Worker>, default_worker: Option<Worker>) -> Self {
        Self {
            workers: workers.into_iter().filter(Worker::is_running).collect(),
            default_worker,
            captured_at: Utc::now(),
        }
    }

    pub fn worker(&self, id: &WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|worker| &worker.id == id)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
