//! Turns a task request into an addressed, ready-to-queue job.
//!
//! Power operations go to the management system's operations queue, scans and
//! syncs go to the scan workers picked by the [`AffinityResolver`], and destroy
//! is a plain queue entry without routing or preconditions.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

use scanroute_common::error::{DispatchError, Result};
use scanroute_common::models::fleet::FleetSnapshot;
use scanroute_common::models::plan::{Callback, DispatchPlan, DispatchTarget, JobHandle, Transport};
use scanroute_common::models::power::STATE_NEVER;
use scanroute_common::models::resource::{RESOURCE_CLASS, Resource};
use scanroute_common::models::task::{TaskKind, TaskRequest};
use scanroute_common::models::worker::Worker;
use scanroute_common::ports::queue::JobQueue;

use crate::affinity::AffinityResolver;
use crate::power::ResourceState;

/// Class identity of the originating task notified by generic callbacks.
pub const TASK_CLASS: &str = "MiqTask";
const POWER_OPS_CALLBACK: &str = "powerops_callback";
const TASK_CALLBACK: &str = "queue_callback";
const TASK_FINISHED: &str = "Finished";

pub struct DispatchPlanner {
    resolver: AffinityResolver,
    queue: Arc<dyn JobQueue>,
}

impl DispatchPlanner {
    pub fn new(resolver: AffinityResolver, queue: Arc<dyn JobQueue>) -> Self {
        Self { resolver, queue }
    }

    pub fn resolver(&self) -> &AffinityResolver {
        &self.resolver
    }

    /// Decides how `request` is addressed. Never enqueues anything.
    pub async fn plan(&self, resource: &Resource, request: &TaskRequest) -> Result<DispatchPlan> {
        let kind = request.kind;
        if kind == TaskKind::Destroy {
            return Ok(self.direct_plan(resource, request));
        }

        check_reachable(resource, kind)?;

        if kind.is_inspection() {
            return self.inspection_plan(resource, request).await;
        }

        if kind.is_power_operation() {
            check_powerable(resource)?;
        }
        Ok(self.operations_plan(resource, request))
    }

    /// Plans `request` and hands the result to the job queue.
    pub async fn dispatch(&self, resource: &Resource, request: &TaskRequest) -> Result<JobHandle> {
        let plan = self.plan(resource, request).await?;
        let handle = self
            .queue
            .enqueue(plan)
            .await
            .map_err(|e| DispatchError::Enqueue(format!("{e:#}")))?;
        info!("queued {} for resource {resource} as {handle}", request.kind);
        Ok(handle)
    }

    fn direct_plan(&self, resource: &Resource, request: &TaskRequest) -> DispatchPlan {
        info!("planning {} for resource {resource} as a direct queue entry", request.kind);
        build_plan(resource, request, Transport::Direct, DispatchTarget::Queue, None)
    }

    fn operations_plan(&self, resource: &Resource, request: &TaskRequest) -> DispatchPlan {
        let mut plan = build_plan(
            resource,
            request,
            Transport::EmsOperations,
            DispatchTarget::Queue,
            Some(self.resolver.zone_of(resource).to_string()),
        );
        plan.affinity = resource.management_system().map(|ems| ems.id.clone());
        info!(
            "planning {} for resource {resource} through {}",
            request.kind, plan.transport
        );
        plan
    }

    async fn inspection_plan(&self, resource: &Resource, request: &TaskRequest) -> Result<DispatchPlan> {
        if resource.host().is_none() && resource.management_system().is_none() {
            let snapshot = self.resolver.snapshot().await?;
            let worker = self.repository_worker(resource, &snapshot)?;
            info!(
                "planning {} for repository resource {resource} on default worker {}",
                request.kind, worker.id
            );
            return Ok(build_plan(
                resource,
                request,
                Transport::Smartstate,
                DispatchTarget::Worker {
                    id: worker.id.clone(),
                },
                Some(worker.zone.clone()),
            ));
        }

        let resolution = self.resolver.resolve(resource).await?;
        if !resolution.has_active_worker() {
            return Err(DispatchError::NoEligibleWorker(resolution.message.to_string()));
        }

        let candidates = resolution.active_ids();
        info!(
            "planning {} for resource {resource} on {} eligible workers",
            request.kind,
            candidates.len()
        );
        let mut plan = build_plan(
            resource,
            request,
            Transport::Smartstate,
            DispatchTarget::Resolver { candidates },
            Some(self.resolver.zone_of(resource).to_string()),
        );
        plan.affinity = resource.management_system().map(|ems| ems.id.clone());
        Ok(plan)
    }

    /// The configured worker for resources that live on a repository.
    fn repository_worker<'a>(
        &self,
        resource: &Resource,
        snapshot: &'a FleetSnapshot,
    ) -> Result<&'a Worker> {
        let not_reachable = |reason: &str| DispatchError::NotReachable {
            resource: resource.id,
            reason: reason.to_string(),
        };

        if self.resolver.cache().default_worker_id().is_none() {
            return Err(not_reachable("no default repository worker is configured"));
        }
        let worker = snapshot
            .default_worker
            .as_ref()
            .ok_or_else(|| not_reachable("the default repository worker no longer exists"))?;
        if !worker.is_running() {
            return Err(not_reachable("the default repository worker is not running"));
        }
        Ok(worker)
    }
}

impl std::fmt::Debug for DispatchPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchPlanner")
            .field("resolver", &self.resolver)
            .finish()
    }
}

fn check_reachable(resource: &Resource, kind: TaskKind) -> Result<()> {
    if kind.tolerates_missing_host()
        || resource.host().is_some()
        || resource.management_system().is_some()
    {
        return Ok(());
    }

    let reason = if resource.storage().is_none() {
        "no owning host or datastore"
    } else if kind.is_inspection() {
        // Repository resources are scanned by the default worker.
        return Ok(());
    } else {
        "no owning host"
    };

    Err(DispatchError::NotReachable {
        resource: resource.id,
        reason: format!("{reason}, '{kind}' is not allowed"),
    })
}

fn check_powerable(resource: &Resource) -> Result<()> {
    if resource.management_system().is_none() {
        return Err(DispatchError::NotReachable {
            resource: resource.id,
            reason: "not associated with a management system".to_string(),
        });
    }
    if resource.template || resource.current_state() == STATE_NEVER {
        return Err(DispatchError::NotReachable {
            resource: resource.id,
            reason: "the resource has no power state".to_string(),
        });
    }
    Ok(())
}

fn build_plan(
    resource: &Resource,
    request: &TaskRequest,
    transport: Transport,
    target: DispatchTarget,
    zone: Option<String>,
) -> DispatchPlan {
    DispatchPlan {
        transport,
        target,
        affinity: None,
        zone,
        class_name: RESOURCE_CLASS.to_string(),
        instance_id: resource.id,
        method_name: request.kind.as_str().to_string(),
        args: task_arguments(request),
        task_id: request.task_id,
        callback: callback(resource, request),
        attribution: request.requester,
    }
}

fn task_arguments(request: &TaskRequest) -> Vec<Value> {
    let options = &request.options;
    match request.kind {
        TaskKind::Scan | TaskKind::Sync => vec![json!(options.userid)],
        TaskKind::RemoveSnapshot | TaskKind::RevertToSnapshot => vec![json!(options.snapshot)],
        TaskKind::CreateSnapshot => vec![
            json!(options.name),
            json!(options.description),
            json!(options.memory),
        ],
        _ => Vec::new(),
    }
}

/// Power operations report back through the resource, which then finishes the
/// originating task with status, message and result. Everything else finishes
/// the task directly.
fn callback(resource: &Resource, request: &TaskRequest) -> Option<Callback> {
    let task_id = request.task_id?;
    let callback = if request.kind.is_power_operation() {
        Callback {
            class_name: RESOURCE_CLASS.to_string(),
            instance_id: resource.id.0,
            method_name: POWER_OPS_CALLBACK.to_string(),
            args: vec![json!(task_id.0)],
        }
    } else {
        Callback {
            class_name: TASK_CLASS.to_string(),
            instance_id: task_id.0,
            method_name: TASK_CALLBACK.to_string(),
            args: vec![json!(TASK_FINISHED)],
        }
    };
    Some(callback)
}
