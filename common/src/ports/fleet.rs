use crate::models::worker::{Worker, WorkerId};

#[async_trait::async_trait]
pub trait WorkerFleet: Send + Sync {
    /// Full scan of the fleet, filtered to running workers, with zone and
    /// capability metadata populated.
    async fn fetch_running_workers(&self) -> anyhow::Result<Vec<Worker>>;

    /// Looks up the configured default worker.
    ///
    /// # Returns
    /// * `Ok(None)` - If no worker with that identity exists.
    async fn resolve_default_worker(&self, id: &WorkerId) -> anyhow::Result<Option<Worker>>;
}
