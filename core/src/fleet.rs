//! TTL-bounded cache of the fleet snapshot.
//!
//! Enumerating the running workers is the expensive query of a dispatch loop, so
//! one [`FleetSnapshot`] is shared by every caller until it expires. Refreshes are
//! single-flight: the first caller past expiry spawns the fetch and everyone else
//! arriving before it finishes waits on that same fetch.
//!
//! The fetch runs on its own task. A caller that stops waiting, or times out,
//! does not cancel it; the result still lands in the cache for later readers.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use scanroute_common::config::Config;
use scanroute_common::error::FleetError;
use scanroute_common::models::fleet::FleetSnapshot;
use scanroute_common::models::worker::WorkerId;
use scanroute_common::ports::fleet::WorkerFleet;

type Outcome = Result<Arc<FleetSnapshot>, FleetError>;

#[derive(Clone)]
pub struct FleetSnapshotCache {
    shared: Arc<Shared>,
}

struct Shared {
    fleet: Arc<dyn WorkerFleet>,
    default_worker: Option<WorkerId>,
    ttl: Duration,
    refresh_timeout: Duration,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    current: Option<Entry>,
    in_flight: Option<InFlight>,
    /// Bumped on every invalidation.
    epoch: u64,
    next_refresh: u64,
}

struct Entry {
    snapshot: Arc<FleetSnapshot>,
    refresh: u64,
    expires_at: Instant,
    /// Set by `invalidate`, or when the snapshot was fetched before the latest one.
    stale: bool,
}

impl Entry {
    fn is_fresh(&self, now: Instant) -> bool {
        !self.stale && now < self.expires_at
    }
}

struct InFlight {
    id: u64,
    deadline: Instant,
    rx: watch::Receiver<Option<Outcome>>,
}

impl FleetSnapshotCache {
    pub fn new(fleet: Arc<dyn WorkerFleet>, config: &Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                fleet,
                default_worker: config.default_worker.clone(),
                ttl: config.snapshot_ttl,
                refresh_timeout: config.refresh_timeout,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Returns the cached snapshot, refreshing it first when expired or invalidated.
    ///
    /// A failed or timed-out refresh falls back to the last good snapshot. The
    /// error is only returned when no snapshot was ever captured.
    pub async fn get(&self) -> Result<Arc<FleetSnapshot>, FleetError> {
        let (rx, deadline) = {
            let mut state = self.shared.lock();
            let now = Instant::now();

            if let Some(entry) = state.current.as_ref().filter(|entry| entry.is_fresh(now)) {
                return Ok(Arc::clone(&entry.snapshot));
            }

            match state.in_flight.as_ref().filter(|flight| now < flight.deadline) {
                Some(flight) => {
                    debug!("joining fleet refresh {}", flight.id);
                    (flight.rx.clone(), flight.deadline)
                }
                None => self.start_refresh(&mut state, now),
            }
        };

        match wait_for_outcome(rx, deadline, self.shared.refresh_timeout).await {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => match self.current() {
                Some(previous) => {
                    warn!(
                        "{err}, serving fleet snapshot captured at {}",
                        previous.captured_at
                    );
                    Ok(previous)
                }
                None => Err(err),
            },
        }
    }

    /// Forces the next [`get`](Self::get) to refresh regardless of the TTL.
    pub fn invalidate(&self) {
        let mut state = self.shared.lock();
        state.epoch += 1;
        state.in_flight = None;
        if let Some(entry) = state.current.as_mut() {
            entry.stale = true;
        }
        debug!("fleet snapshot invalidated");
    }

    /// Repository-scan worker the snapshots are resolved against, if configured.
    pub fn default_worker_id(&self) -> Option<&WorkerId> {
        self.shared.default_worker.as_ref()
    }

    /// Last captured snapshot, fresh or not. Never triggers a refresh.
    pub fn current(&self) -> Option<Arc<FleetSnapshot>> {
        let state = self.shared.lock();
        state.current.as_ref().map(|entry| Arc::clone(&entry.snapshot))
    }

    fn start_refresh(
        &self,
        state: &mut CacheState,
        now: Instant,
    ) -> (watch::Receiver<Option<Outcome>>, Instant) {
        let id = state.next_refresh;
        state.next_refresh += 1;
        let epoch = state.epoch;
        let deadline = now + self.shared.refresh_timeout;

        let (tx, rx) = watch::channel(None);
        state.in_flight = Some(InFlight {
            id,
            deadline,
            rx: rx.clone(),
        });
        debug!("starting fleet refresh {id}");

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            let outcome = shared.fetch().await;
            shared.install(id, epoch, &outcome);
            tx.send_replace(Some(outcome));
        });

        (rx, deadline)
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(&self) -> Outcome {
        let workers = self
            .fleet
            .fetch_running_workers()
            .await
            .map_err(|e| FleetError::RefreshFailed(format!("{e:#}")))?;

        let default_worker = match &self.default_worker {
            Some(id) => self
                .fleet
                .resolve_default_worker(id)
                .await
                .map_err(|e| FleetError::RefreshFailed(format!("{e:#}")))?,
            None => None,
        };

        Ok(Arc::new(FleetSnapshot::new(workers, default_worker)))
    }

    fn install(&self, id: u64, epoch: u64, outcome: &Outcome) {
        let mut state = self.lock();
        if state.in_flight.as_ref().is_some_and(|flight| flight.id == id) {
            state.in_flight = None;
        }

        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("fleet refresh {id} failed: {err}");
                return;
            }
        };

        // A slow refresh must not replace what a later one already installed.
        if state.current.as_ref().is_some_and(|entry| entry.refresh > id) {
            debug!("discarding fleet refresh {id}, a newer snapshot is installed");
            return;
        }

        debug!("fleet refresh {id} captured {} running workers", snapshot.len());
        state.current = Some(Entry {
            snapshot: Arc::clone(snapshot),
            refresh: id,
            expires_at: Instant::now() + self.ttl,
            stale: epoch != state.epoch,
        });
    }
}

async fn wait_for_outcome(
    mut rx: watch::Receiver<Option<Outcome>>,
    deadline: Instant,
    limit: Duration,
) -> Outcome {
    match time::timeout_at(deadline, rx.wait_for(Option::is_some)).await {
        Ok(Ok(outcome)) => (*outcome).clone().unwrap_or_else(|| {
            Err(FleetError::RefreshFailed("refresh reported no result".to_string()))
        }),
        Ok(Err(_)) => Err(FleetError::RefreshFailed(
            "refresh task ended without reporting".to_string(),
        )),
        Err(_) => Err(FleetError::Timeout(limit)),
    }
}

impl fmt::Debug for FleetSnapshotCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("FleetSnapshotCache")
            .field("ttl", &self.shared.ttl)
            .field("refresh_timeout", &self.shared.refresh_timeout)
            .field("default_worker", &self.shared.default_worker)
            .field("has_snapshot", &state.current.is_some())
            .field("refresh_in_flight", &state.in_flight.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use scanroute_common::models::worker::{Worker, WorkerStatus};

    struct CountingFleet {
        fetches: AtomicUsize,
        delay: Duration,
        failing: AtomicBool,
        stalled: AtomicBool,
    }

    impl CountingFleet {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
                delay,
                failing: AtomicBool::new(false),
                stalled: AtomicBool::new(false),
            })
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl WorkerFleet for CountingFleet {
        async fn fetch_running_workers(&self) -> anyhow::Result<Vec<Worker>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                time::sleep(self.delay).await;
            }
            if self.stalled.load(Ordering::SeqCst) {
                time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("fleet query rejected");
            }
            Ok(vec![
                Worker::new("w1", "east"),
                Worker::new("w2", "east").with_status(WorkerStatus::Stopped),
            ])
        }

        async fn resolve_default_worker(&self, id: &WorkerId) -> anyhow::Result<Option<Worker>> {
            Ok(Some(Worker::new(id.clone(), "east")))
        }
    }

    fn config() -> Config {
        Config {
            default_worker: Some(WorkerId::from("repo")),
            ..Config::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_cold_reads_share_one_fetch() {
        let fleet = CountingFleet::new(Duration::from_millis(200));
        let cache = FleetSnapshotCache::new(fleet.clone(), &config());

        let (first, second) = tokio::join!(cache.get(), cache.get());
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(fleet.fetches(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1, "stopped workers are not part of the snapshot");
        assert_eq!(
            first.default_worker.as_ref().map(|w| w.id.as_str()),
            Some("repo")
        );
        assert_eq!(cache.default_worker_id(), Some(&WorkerId::from("repo")));
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_once_after_ttl() {
        let fleet = CountingFleet::new(Duration::ZERO);
        let cache = FleetSnapshotCache::new(fleet.clone(), &config());

        cache.get().await.unwrap();
        time::advance(Duration::from_secs(29)).await;
        cache.get().await.unwrap();
        assert_eq!(fleet.fetches(), 1);

        time::advance(Duration::from_secs(2)).await;
        let (a, b) = tokio::join!(cache.get(), cache.get());
        a.unwrap();
        b.unwrap();
        assert_eq!(fleet.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_refresh() {
        let fleet = CountingFleet::new(Duration::ZERO);
        let cache = FleetSnapshotCache::new(fleet.clone(), &config());

        cache.get().await.unwrap();
        cache.invalidate();
        cache.get().await.unwrap();
        cache.get().await.unwrap();
        assert_eq!(fleet.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cold_failure_reaches_every_waiter() {
        let fleet = CountingFleet::new(Duration::from_millis(50));
        fleet.failing.store(true, Ordering::SeqCst);
        let cache = FleetSnapshotCache::new(fleet.clone(), &config());

        let (first, second) = tokio::join!(cache.get(), cache.get());
        assert!(matches!(first, Err(FleetError::RefreshFailed(_))));
        assert_eq!(first.unwrap_err(), second.unwrap_err());
        assert_eq!(fleet.fetches(), 1);
        assert!(cache.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_snapshot() {
        let fleet = CountingFleet::new(Duration::ZERO);
        let cache = FleetSnapshotCache::new(fleet.clone(), &config());

        let good = cache.get().await.unwrap();
        fleet.failing.store(true, Ordering::SeqCst);
        time::advance(Duration::from_secs(31)).await;

        let served = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&good, &served));
        assert_eq!(fleet.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_refresh_times_out_but_still_lands() {
        let fleet = CountingFleet::new(Duration::from_secs(60));
        let cache = FleetSnapshotCache::new(fleet.clone(), &config());

        let err = cache.get().await.unwrap_err();
        assert_eq!(err, FleetError::Timeout(Config::default().refresh_timeout));

        time::sleep(Duration::from_secs(61)).await;
        assert!(cache.current().is_some());
        cache.get().await.unwrap();
        assert_eq!(fleet.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cold_timeout_reaches_every_waiter() {
        let fleet = CountingFleet::new(Duration::from_secs(60));
        let cache = FleetSnapshotCache::new(fleet.clone(), &config());

        let (first, second) = tokio::join!(cache.get(), cache.get());
        let timeout = FleetError::Timeout(Config::default().refresh_timeout);
        assert_eq!(first.unwrap_err(), timeout);
        assert_eq!(second.unwrap_err(), timeout);
        assert_eq!(fleet.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn warm_timeout_serves_previous_snapshot_to_every_waiter() {
        let fleet = CountingFleet::new(Duration::ZERO);
        let cache = FleetSnapshotCache::new(fleet.clone(), &config());

        let good = cache.get().await.unwrap();
        fleet.stalled.store(true, Ordering::SeqCst);
        time::advance(Duration::from_secs(31)).await;

        let (first, second) = tokio::join!(cache.get(), cache.get());
        assert!(Arc::ptr_eq(&good, &first.unwrap()));
        assert!(Arc::ptr_eq(&good, &second.unwrap()));
        assert_eq!(fleet.fetches(), 2);
    }
}
