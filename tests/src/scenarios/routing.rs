use scanroute_common::config::Config;
use scanroute_common::models::resource::{HostLink, Resource, Vendor, Volume};
use scanroute_common::models::worker::{Capability, Worker, WorkerId, WorkerStatus};
use scanroute_core::affinity::ResolveMessage;
use scanroute_core::testing::StaticFleet;

use super::World;

fn storage_aware(id: &str, zone: &str) -> Worker {
    Worker::new(id, zone)
        .with_capability(Capability::HostAffinityAware)
        .with_capability(Capability::StorageAffinityAware)
        .with_capability(Capability::DirectDiskAccess)
        .with_capability(Capability::DelegatedCredentials)
}

fn resource_on_two_volumes() -> Resource {
    Resource::new(1, "r", Vendor::Vmware)
        .with_management_system("ems", "z")
        .with_host(HostLink::new("h").with_affinity(["w1", "w2", "w3"]))
        .with_storage("vol1")
        .with_volume(Volume::new("vol1").with_affinity(["w1", "w2"]))
        .with_volume(Volume::new("vol2").with_affinity(["w2", "w3"]))
}

#[tokio::test]
async fn volume_affinities_intersect_to_the_shared_worker() {
    let world = World::new(
        StaticFleet::new(vec![
            storage_aware("w1", "z"),
            storage_aware("w2", "z"),
            storage_aware("w3", "z"),
        ]),
        Config::default(),
    );

    let resolution = world.resolver().resolve(&resource_on_two_volumes()).await.unwrap();

    assert_eq!(resolution.active_ids(), vec![WorkerId::from("w2")]);
    assert_eq!(resolution.message, ResolveMessage::Ready);
}

#[tokio::test]
async fn shared_worker_in_another_zone_leaves_nothing() {
    let world = World::new(
        StaticFleet::new(vec![
            storage_aware("w1", "z"),
            storage_aware("w2", "elsewhere"),
            storage_aware("w3", "z"),
        ]),
        Config::default(),
    );

    let resolution = world.resolver().resolve(&resource_on_two_volumes()).await.unwrap();

    assert!(!resolution.has_worker());
    assert_eq!(resolution.message, ResolveMessage::NoEligibleWorkers);
}

#[tokio::test]
async fn invalid_credentials_only_drop_delegating_workers() {
    let local = Worker::new("local", "z").with_capability(Capability::DirectDiskAccess);
    let world = World::new(
        StaticFleet::new(vec![storage_aware("w2", "z"), local]),
        Config::default(),
    );
    world.credentials.set_valid("ems", false);

    let resource = Resource::new(1, "r", Vendor::Vmware)
        .with_management_system("ems", "z")
        .with_host(HostLink::new("h"))
        .with_storage("vol1");
    let resolution = world.resolver().resolve(&resource).await.unwrap();

    assert_eq!(resolution.all.len(), 2);
    assert_eq!(resolution.active_ids(), vec![WorkerId::from("local")]);
}

#[tokio::test]
async fn host_credentials_gate_when_scanning_via_host() {
    let config = Config {
        scan_via_management_system: false,
        ..Config::default()
    };
    let world = World::new(StaticFleet::new(vec![storage_aware("w2", "z")]), config);
    world.credentials.set_valid("h", false);

    let resolution = world.resolver().resolve(&resource_on_two_volumes()).await.unwrap();

    assert!(resolution.has_worker());
    assert!(!resolution.has_active_worker());
    assert_eq!(resolution.message, ResolveMessage::CredentialsRequired);
}

#[tokio::test]
async fn stopped_workers_never_show_up() {
    let world = World::new(
        StaticFleet::new(vec![storage_aware("w2", "z").with_status(WorkerStatus::Stopped)]),
        Config::default(),
    );

    let resolution = world.resolver().resolve(&resource_on_two_volumes()).await.unwrap();

    assert!(!resolution.has_worker());
}
