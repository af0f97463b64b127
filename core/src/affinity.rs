//! Selection of the workers that may scan a resource.
//!
//! Filters run in a fixed order: vendor support, host and storage affinity,
//! zone, vendor capability, and finally runtime/credential status. The last
//! stage is kept apart so callers can tell "nothing can ever serve this
//! resource" from "something could, but is not authorized right now".

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use scanroute_common::config::Config;
use scanroute_common::error::FleetError;
use scanroute_common::models::fleet::FleetSnapshot;
use scanroute_common::models::resource::{ConnectionId, Resource, Vendor};
use scanroute_common::models::worker::{Capability, Worker, WorkerId};
use scanroute_common::ports::credentials::CredentialStore;

use crate::fleet::FleetSnapshotCache;

/// Which worker identities an affinity declaration lets through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffinityConstraint {
    /// Nothing declared an affinity.
    Unconstrained,
    /// Only these workers. An empty set admits nobody.
    Restricted(BTreeSet<WorkerId>),
}

impl AffinityConstraint {
    /// Affinity of the resource's host. No host, or a host without declared
    /// workers, does not constrain anything.
    pub fn for_host(resource: &Resource) -> Self {
        match resource.host() {
            Some(host) if !host.scan_affinity.is_empty() => {
                AffinityConstraint::Restricted(host.scan_affinity.clone())
            }
            _ => AffinityConstraint::Unconstrained,
        }
    }

    /// Intersection of the affinities of every volume that declares one.
    ///
    /// Volumes with an empty affinity are left out of the intersection. Disjoint
    /// declarations produce an empty restriction, which no worker satisfies.
    pub fn for_storage(resource: &Resource) -> Self {
        resource
            .volumes
            .iter()
            .map(|volume| &volume.scan_affinity)
            .filter(|affinity| !affinity.is_empty())
            .fold(AffinityConstraint::Unconstrained, |acc, affinity| match acc {
                AffinityConstraint::Unconstrained => {
                    AffinityConstraint::Restricted(affinity.clone())
                }
                AffinityConstraint::Restricted(ids) => {
                    AffinityConstraint::Restricted(ids.intersection(affinity).cloned().collect())
                }
            })
    }

    /// Whether `worker` passes. A declared affinity only lets through workers
    /// that have the `aware` capability and are listed.
    pub fn admits(&self, worker: &Worker, aware: Capability) -> bool {
        match self {
            AffinityConstraint::Unconstrained => true,
            AffinityConstraint::Restricted(ids) => worker.has(aware) && ids.contains(&worker.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMessage {
    NoEligibleWorkers,
    CredentialsRequired,
    Ready,
}

impl ResolveMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveMessage::NoEligibleWorkers => "no eligible workers found",
            ResolveMessage::CredentialsRequired => {
                "credentials required to reach the host/management system"
            }
            ResolveMessage::Ready => "eligible workers found to scan this resource",
        }
    }
}

impl fmt::Display for ResolveMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`AffinityResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Candidates that can run the scan right now.
    pub active: Vec<Worker>,
    /// Candidates before runtime and credential checks.
    pub all: Vec<Worker>,
    pub message: ResolveMessage,
}

impl Resolution {
    pub fn has_worker(&self) -> bool {
        !self.all.is_empty()
    }

    pub fn has_active_worker(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_ids(&self) -> Vec<WorkerId> {
        self.active.iter().map(|worker| worker.id.clone()).collect()
    }
}

pub struct AffinityResolver {
    cache: FleetSnapshotCache,
    credentials: Arc<dyn CredentialStore>,
    default_zone: String,
    scan_via_management_system: bool,
}

impl AffinityResolver {
    pub fn new(
        cache: FleetSnapshotCache,
        credentials: Arc<dyn CredentialStore>,
        config: &Config,
    ) -> Self {
        Self {
            cache,
            credentials,
            default_zone: config.default_zone.clone(),
            scan_via_management_system: config.scan_via_management_system,
        }
    }

    /// Current fleet snapshot, from the shared cache.
    pub async fn snapshot(&self) -> Result<Arc<FleetSnapshot>, FleetError> {
        self.cache.get().await
    }

    pub fn cache(&self) -> &FleetSnapshotCache {
        &self.cache
    }

    /// Zone of the resource's management system, or the process default.
    pub fn zone_of<'a>(&'a self, resource: &'a Resource) -> &'a str {
        match resource.management_system() {
            Some(ems) => &ems.zone,
            None => &self.default_zone,
        }
    }

    pub async fn resolve(&self, resource: &Resource) -> Result<Resolution, FleetError> {
        let snapshot = self.snapshot().await?;
        Ok(self.resolve_with(resource, &snapshot))
    }

    /// [`resolve`](Self::resolve) against an already captured snapshot.
    pub fn resolve_with(&self, resource: &Resource, snapshot: &FleetSnapshot) -> Resolution {
        let all = self.all_candidates(resource, snapshot);
        let active = self.active_candidates(resource, &all);

        let message = if all.is_empty() {
            ResolveMessage::NoEligibleWorkers
        } else if active.is_empty() {
            ResolveMessage::CredentialsRequired
        } else {
            ResolveMessage::Ready
        };

        if active.is_empty() {
            log_all_candidates(resource, &all, message);
        }

        Resolution {
            active,
            all,
            message,
        }
    }

    fn all_candidates(&self, resource: &Resource, snapshot: &FleetSnapshot) -> Vec<Worker> {
        if let Err(reason) = vendor_support(resource) {
            debug!("resource {resource} cannot be scanned by fleet workers: {reason}");
            return Vec::new();
        }

        let host_affinity = AffinityConstraint::for_host(resource);
        let storage_affinity = AffinityConstraint::for_storage(resource);
        debug!("host affinity = {host_affinity:?}, storage affinity = {storage_affinity:?}");
        debug!("running workers = {}", snapshot.len());

        let mut candidates: Vec<Worker> = snapshot
            .workers
            .iter()
            .filter(|worker| {
                host_affinity.admits(worker, Capability::HostAffinityAware)
                    && storage_affinity.admits(worker, Capability::StorageAffinityAware)
            })
            .cloned()
            .collect();
        debug!("candidates after affinity = {}", candidates.len());

        let zone = self.zone_of(resource);
        candidates.retain(|worker| worker.in_zone(zone));
        debug!("candidates after zone {zone} = {}", candidates.len());

        if resource.vendor.requires_direct_disk_access() {
            candidates.retain(|worker| worker.has(Capability::DirectDiskAccess));
            debug!("candidates after direct disk access = {}", candidates.len());
        }

        candidates
    }

    fn active_candidates(&self, resource: &Resource, all: &[Worker]) -> Vec<Worker> {
        let mut active: Vec<Worker> = all.iter().filter(|w| w.is_running()).cloned().collect();
        debug!("active candidates after status = {}", active.len());

        // Workers using delegated credentials log into whichever connection the
        // scan goes through. Without working credentials there, none of them can.
        if let Some(connection) = self.credential_connection(resource)
            && !self.credentials.credentials_valid(connection)
        {
            active.retain(|worker| !worker.has(Capability::DelegatedCredentials));
            debug!(
                "active candidates after credentials of {connection} = {}",
                active.len()
            );
        }

        active
    }

    fn credential_connection<'a>(&self, resource: &'a Resource) -> Option<&'a ConnectionId> {
        if self.scan_via_management_system {
            resource.management_system().map(|ems| &ems.id)
        } else {
            resource.host().map(|host| &host.id)
        }
    }
}

impl fmt::Debug for AffinityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityResolver")
            .field("cache", &self.cache)
            .field("default_zone", &self.default_zone)
            .field("scan_via_management_system", &self.scan_via_management_system)
            .finish()
    }
}

/// Vendors whose resources fleet workers know how to open.
fn vendor_support(resource: &Resource) -> Result<(), &'static str> {
    match resource.vendor {
        Vendor::Vmware if resource.storage().is_none() => Err("no primary storage"),
        Vendor::Vmware if resource.host().is_none() => Err("resource lives on a repository"),
        Vendor::Vmware => Ok(()),
        Vendor::Microsoft if resource.storage().is_none() => Err("no primary storage"),
        Vendor::Microsoft => Ok(()),
        _ => Err("vendor not supported"),
    }
}

fn log_all_candidates(resource: &Resource, all: &[Worker], message: ResolveMessage) {
    let workers = if all.is_empty() {
        "[none]".to_string()
    } else {
        all.iter()
            .map(|worker| format!("[{worker}]"))
            .collect::<Vec<_>>()
            .join(" -- ")
    };
    let host = resource
        .host()
        .map(|host| format!("{}-{}", host.id, host.name))
        .unwrap_or_else(|| "Nil".to_string());
    let storage = resource
        .storage()
        .map(|storage| storage.to_string())
        .unwrap_or_else(|| "No storage".to_string());

    warn!("Workers for [{resource}] on host [{host}] datastore [{storage}] : {workers}");
    warn!("Workers message: {message}");
}
