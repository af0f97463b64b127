use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::power::PowerState;
use super::worker::WorkerId;

/// Class identity jobs are addressed to.
pub const RESOURCE_CLASS: &str = "VmOrTemplate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a connection that holds credentials (a host or a management system).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageId(String);

impl StorageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for StorageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Vmware,
    Microsoft,
    Redhat,
    Amazon,
    Openstack,
    #[serde(other)]
    Unknown,
}

impl Vendor {
    /// Workers must be able to open the disks directly to scan this vendor's resources.
    pub fn requires_direct_disk_access(&self) -> bool {
        matches!(self, Vendor::Vmware)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Vmware => "vmware",
            Vendor::Microsoft => "microsoft",
            Vendor::Redhat => "redhat",
            Vendor::Amazon => "amazon",
            Vendor::Openstack => "openstack",
            Vendor::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementSystemLink {
    pub id: ConnectionId,
    #[serde(default)]
    pub name: String,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLink {
    pub id: ConnectionId,
    #[serde(default)]
    pub name: String,
    /// Workers declared affine to this host. Empty means no restriction.
    #[serde(default)]
    pub scan_affinity: BTreeSet<WorkerId>,
}

impl HostLink {
    pub fn new(id: impl Into<ConnectionId>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            scan_affinity: BTreeSet::new(),
        }
    }

    pub fn with_affinity<I, W>(mut self, workers: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<WorkerId>,
    {
        self.scan_affinity.extend(workers.into_iter().map(Into::into));
        self
    }
}

/// Storage backing attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: StorageId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub store_type: Option<String>,
    /// Workers that may access this volume efficiently. Empty means no restriction.
    #[serde(default)]
    pub scan_affinity: BTreeSet<WorkerId>,
}

impl Volume {
    pub fn new(id: impl Into<StorageId>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            store_type: None,
            scan_affinity: BTreeSet::new(),
        }
    }

    pub fn with_affinity<I, W>(mut self, workers: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<WorkerId>,
    {
        self.scan_affinity.extend(workers.into_iter().map(Into::into));
        self
    }
}

/// Read-only projection of a virtual machine or template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub vendor: Vendor,
    #[serde(default)]
    pub template: bool,
    #[serde(default)]
    pub retired: bool,
    #[serde(default)]
    pub connection_state: Option<String>,
    #[serde(default)]
    pub management_system: Option<ManagementSystemLink>,
    #[serde(default)]
    pub host: Option<HostLink>,
    /// Primary datastore.
    #[serde(default)]
    pub storage: Option<StorageId>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub power: PowerState,
}

impl Resource {
    pub fn new(id: u64, name: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            id: ResourceId(id),
            name: name.into(),
            vendor,
            template: false,
            retired: false,
            connection_state: None,
            management_system: None,
            host: None,
            storage: None,
            volumes: Vec::new(),
            power: PowerState::default(),
        }
    }

    pub fn with_host(mut self, host: HostLink) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_management_system(mut self, id: impl Into<ConnectionId>, zone: impl Into<String>) -> Self {
        let id = id.into();
        self.management_system = Some(ManagementSystemLink {
            name: id.to_string(),
            id,
            zone: zone.into(),
        });
        self
    }

    pub fn with_storage(mut self, storage: impl Into<StorageId>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }

    pub fn host(&self) -> Option<&HostLink> {
        self.host.as_ref()
    }

    pub fn management_system(&self) -> Option<&ManagementSystemLink> {
        self.management_system.as_ref()
    }

    pub fn storage(&self) -> Option<&StorageId> {
        self.storage.as_ref()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.name)
    }
}
