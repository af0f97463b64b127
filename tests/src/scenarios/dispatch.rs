use serde_json::json;

use scanroute_common::config::Config;
use scanroute_common::error::DispatchError;
use scanroute_common::models::plan::{DispatchTarget, Transport};
use scanroute_common::models::resource::{HostLink, RESOURCE_CLASS, Resource, Vendor};
use scanroute_common::models::task::{Requester, TaskKind, TaskRequest};
use scanroute_common::models::worker::{Capability, Worker, WorkerId};
use scanroute_core::power::{ResourceState, set_raw_state};
use scanroute_core::testing::StaticFleet;

use super::World;

fn vm() -> Resource {
    Resource::new(11, "web", Vendor::Vmware)
        .with_management_system("ems", "z")
        .with_host(HostLink::new("h"))
        .with_storage("ds")
}

fn scanner(id: &str) -> Worker {
    Worker::new(id, "z")
        .with_capability(Capability::DirectDiskAccess)
        .with_capability(Capability::DelegatedCredentials)
}

#[tokio::test]
async fn scan_without_authorized_workers_never_reaches_the_queue() {
    let world = World::new(StaticFleet::new(vec![scanner("w1")]), Config::default());
    world.credentials.set_valid("ems", false);

    let err = world
        .planner
        .dispatch(&vm(), &TaskRequest::new(TaskKind::Scan))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::NoEligibleWorker(_)));
    assert!(world.queue.is_empty());
}

#[tokio::test]
async fn power_operation_is_queued_with_attribution() {
    let world = World::new(StaticFleet::new(Vec::new()), Config::default());
    let mut resource = vm();
    assert!(set_raw_state(&mut resource, "poweredOn"));
    assert!(!set_raw_state(&mut resource, "poweredOn"));
    assert_eq!(resource.state_label().as_str(), "unknown");

    let requester = Requester {
        user_id: 4,
        group_id: 5,
        tenant_id: 6,
    };
    let request = TaskRequest::new(TaskKind::ShutdownGuest)
        .with_task(77)
        .with_requester(requester);
    let handle = world.planner.dispatch(&resource, &request).await.unwrap();

    assert_eq!(handle.0, "job-1");
    let plans = world.queue.plans();
    let plan = &plans[0];
    assert_eq!(plan.service(), Some("ems_operations"));
    assert_eq!(plan.target, DispatchTarget::Queue);
    assert_eq!(plan.affinity.as_ref().map(|c| c.as_str()), Some("ems"));
    assert_eq!(plan.zone.as_deref(), Some("z"));
    assert_eq!(plan.class_name, RESOURCE_CLASS);
    assert_eq!(plan.method_name, "shutdown_guest");
    assert_eq!(plan.attribution, Some(requester));

    let callback = plan.callback.as_ref().unwrap();
    assert_eq!(callback.method_name, "powerops_callback");
    assert_eq!(callback.args, vec![json!(77)]);

    let encoded = serde_json::to_value(plan).unwrap();
    assert_eq!(encoded["user_id"], json!(4));
    assert_eq!(encoded["tenant_id"], json!(6));
}

#[tokio::test]
async fn destroy_of_an_archived_resource_is_queued_directly() {
    let world = World::new(StaticFleet::new(Vec::new()), Config::default());
    let archived = Resource::new(12, "old", Vendor::Vmware);
    assert_eq!(archived.state_label().as_str(), "archived");

    world
        .planner
        .dispatch(&archived, &TaskRequest::new(TaskKind::Destroy))
        .await
        .unwrap();

    let plan = &world.queue.plans()[0];
    assert_eq!(plan.transport, Transport::Direct);
    assert_eq!(plan.service(), None);
    assert_eq!(plan.affinity, None);
}

#[tokio::test]
async fn repository_resource_scans_on_the_default_worker() {
    let config = Config {
        default_worker: Some(WorkerId::from("repo")),
        ..Config::default()
    };
    let world = World::new(StaticFleet::new(vec![scanner("repo"), scanner("w1")]), config);
    let repository = Resource::new(13, "image", Vendor::Vmware).with_storage("repo-store");
    assert!(repository.is_repository_resource());

    world
        .planner
        .dispatch(&repository, &TaskRequest::new(TaskKind::Sync))
        .await
        .unwrap();

    let plan = &world.queue.plans()[0];
    assert_eq!(plan.transport, Transport::Smartstate);
    assert_eq!(
        plan.target,
        DispatchTarget::Worker {
            id: WorkerId::from("repo")
        }
    );
}

#[tokio::test]
async fn repository_resource_cannot_run_other_tasks() {
    let world = World::new(StaticFleet::new(Vec::new()), Config::default());
    let repository = Resource::new(13, "image", Vendor::Vmware).with_storage("repo-store");

    let err = world
        .planner
        .dispatch(&repository, &TaskRequest::new(TaskKind::Start))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::NotReachable { ref reason, .. } if reason.starts_with("no owning host,")));
    assert!(world.queue.is_empty());
}
