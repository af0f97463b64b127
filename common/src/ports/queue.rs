use crate::models::plan::{DispatchPlan, JobHandle};

/// The task queue that executes dispatched jobs.
///
/// Persistence, retries and delivery guarantees belong to the implementation.
#[async_trait::async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, plan: DispatchPlan) -> anyhow::Result<JobHandle>;
}
