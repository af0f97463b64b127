//! Outbound adapters backed by a JSON inventory file.
//!
//! ```json
//! {
//!   "resources": [{ "id": 7, "name": "db01", "vendor": "vmware", ... }],
//!   "workers": [{ "id": "w1", "zone": "east", "status": "running", "capabilities": ["direct-disk-access"] }],
//!   "credentials": { "vc1": true }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde::Deserialize;

use scanroute_common::models::plan::{DispatchPlan, JobHandle};
use scanroute_common::models::resource::{ConnectionId, Resource};
use scanroute_common::models::worker::{Worker, WorkerId};
use scanroute_common::ports::credentials::CredentialStore;
use scanroute_common::ports::fleet::WorkerFleet;
use scanroute_common::ports::queue::JobQueue;

#[derive(Debug, Default, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub workers: Vec<Worker>,
    /// Connections without an entry have no stored credentials.
    #[serde(default)]
    pub credentials: HashMap<ConnectionId, bool>,
}

impl Inventory {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read inventory {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid inventory {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Looks a resource up by numeric id, then by name.
    pub fn resource(&self, key: &str) -> anyhow::Result<&Resource> {
        let by_id = key.parse::<u64>().ok().and_then(|id| {
            self.resources.iter().find(|resource| resource.id.0 == id)
        });
        if let Some(resource) = by_id {
            return Ok(resource);
        }

        let mut named = self.resources.iter().filter(|resource| resource.name == key);
        match (named.next(), named.next()) {
            (Some(resource), None) => Ok(resource),
            (Some(_), Some(_)) => bail!("resource name '{key}' is ambiguous, use its id"),
            (None, _) => bail!("no resource '{key}' in the inventory"),
        }
    }
}

#[async_trait]
impl WorkerFleet for Inventory {
    async fn fetch_running_workers(&self) -> anyhow::Result<Vec<Worker>> {
        Ok(self.workers.iter().filter(|w| w.is_running()).cloned().collect())
    }

    async fn resolve_default_worker(&self, id: &WorkerId) -> anyhow::Result<Option<Worker>> {
        Ok(self.workers.iter().find(|w| &w.id == id).cloned())
    }
}

impl CredentialStore for Inventory {
    fn credentials_valid(&self, connection: &ConnectionId) -> bool {
        self.credentials.get(connection).copied().unwrap_or(false)
    }
}

/// Writes every submitted plan to stdout as a JSON line.
#[derive(Debug, Default)]
pub struct StdoutQueue {
    submitted: AtomicU64,
}

#[async_trait]
impl JobQueue for StdoutQueue {
    async fn enqueue(&self, plan: DispatchPlan) -> anyhow::Result<JobHandle> {
        let line = serde_json::to_string(&plan).context("failed to encode plan")?;
        println!("{line}");
        let n = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(JobHandle(format!("stdout-{n}")))
    }
}
