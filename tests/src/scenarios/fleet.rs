use std::time::Duration;

use scanroute_common::config::Config;
use scanroute_common::models::worker::{Worker, WorkerId};
use scanroute_core::testing::StaticFleet;

use super::World;

#[tokio::test(start_paused = true)]
async fn concurrent_reads_share_one_fleet_scan() {
    let world = World::new(StaticFleet::new(vec![Worker::new("w1", "z")]), Config::default());
    let cache = world.resolver().cache();

    let (a, b, c) = tokio::join!(cache.get(), cache.get(), cache.get());

    assert_eq!(world.fleet.fetches(), 1);
    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 1);
    assert_eq!(c.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn fleet_changes_show_up_after_the_ttl() {
    let world = World::new(StaticFleet::new(vec![Worker::new("w1", "z")]), Config::default());
    let cache = world.resolver().cache();
    assert_eq!(cache.get().await.unwrap().len(), 1);

    world
        .fleet
        .replace(vec![Worker::new("w1", "z"), Worker::new("w2", "z")]);
    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(cache.get().await.unwrap().len(), 1);

    tokio::time::advance(Duration::from_secs(25)).await;
    let snapshot = cache.get().await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.worker(&WorkerId::from("w2")).is_some());
    assert_eq!(world.fleet.fetches(), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidate_picks_up_changes_immediately() {
    let world = World::new(StaticFleet::new(Vec::new()), Config::default());
    let cache = world.resolver().cache();
    assert!(cache.get().await.unwrap().is_empty());

    world.fleet.replace(vec![Worker::new("w1", "z")]);
    cache.invalidate();

    assert_eq!(cache.get().await.unwrap().len(), 1);
    assert_eq!(world.fleet.fetches(), 2);
}
