use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Running,
    #[default]
    Stopped,
}

/// Declared abilities of a worker, checked by membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Can open a resource's disks directly (required by some vendors).
    DirectDiskAccess,
    /// Only serves resources whose host lists it in its scan affinity.
    HostAffinityAware,
    /// Only serves resources whose volumes list it in their scan affinity.
    StorageAffinityAware,
    /// Logs into the host or management system with that connection's credentials.
    DelegatedCredentials,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::DirectDiskAccess => "direct-disk-access",
            Capability::HostAffinityAware => "host-affinity-aware",
            Capability::StorageAffinityAware => "storage-affinity-aware",
            Capability::DelegatedCredentials => "delegated-credentials",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scan worker as reported by the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: WorkerStatus,
    pub zone: String,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
}

impl Worker {
    /// A running worker in `zone` with no declared capabilities.
    pub fn new(id: impl Into<WorkerId>, zone: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            status: WorkerStatus::Running,
            zone: zone.into(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_status(mut self, status: WorkerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_running(&self) -> bool {
        self.status == WorkerStatus::Running
    }

    pub fn in_zone(&self, zone: &str) -> bool {
        self.zone == zone
    }
}

impl fmt::Display for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            WorkerStatus::Running => "running",
            WorkerStatus::Stopped => "stopped",
        };
        write!(f, "{}:{}-{}:{}", self.id, self.name, self.zone, status)
    }
}
