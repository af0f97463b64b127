//! In-memory implementations of the outbound ports, for tests.
//!
//! Compiled for this crate's unit tests and, through the `testing` feature, for
//! the integration test crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use scanroute_common::models::plan::{DispatchPlan, JobHandle};
use scanroute_common::models::resource::ConnectionId;
use scanroute_common::models::worker::{Worker, WorkerId};
use scanroute_common::ports::credentials::CredentialStore;
use scanroute_common::ports::fleet::WorkerFleet;
use scanroute_common::ports::queue::JobQueue;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fleet backed by a fixed list of workers. Counts fetches.
#[derive(Debug, Default)]
pub struct StaticFleet {
    workers: Mutex<Vec<Worker>>,
    fetches: AtomicUsize,
}

impl StaticFleet {
    /// `workers` may include stopped ones: they are skipped by fetches but
    /// still found as the default worker.
    pub fn new(workers: Vec<Worker>) -> Self {
        Self {
            workers: Mutex::new(workers),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn replace(&self, workers: Vec<Worker>) {
        *lock(&self.workers) = workers;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerFleet for StaticFleet {
    async fn fetch_running_workers(&self) -> anyhow::Result<Vec<Worker>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let workers = lock(&self.workers);
        Ok(workers.iter().filter(|w| w.is_running()).cloned().collect())
    }

    async fn resolve_default_worker(&self, id: &WorkerId) -> anyhow::Result<Option<Worker>> {
        let workers = lock(&self.workers);
        Ok(workers.iter().find(|w| &w.id == id).cloned())
    }
}

/// Every connection is valid unless marked otherwise.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    validity: Mutex<HashMap<ConnectionId, bool>>,
}

impl StaticCredentials {
    pub fn set_valid(&self, connection: impl Into<ConnectionId>, valid: bool) {
        lock(&self.validity).insert(connection.into(), valid);
    }
}

impl CredentialStore for StaticCredentials {
    fn credentials_valid(&self, connection: &ConnectionId) -> bool {
        lock(&self.validity).get(connection).copied().unwrap_or(true)
    }
}

/// Queue that keeps every plan it is handed.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    plans: Mutex<Vec<DispatchPlan>>,
}

impl RecordingQueue {
    pub fn plans(&self) -> Vec<DispatchPlan> {
        lock(&self.plans).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.plans).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, plan: DispatchPlan) -> anyhow::Result<JobHandle> {
        let mut plans = lock(&self.plans);
        plans.push(plan);
        Ok(JobHandle(format!("job-{}", plans.len())))
    }
}
