mod dispatch;
mod fleet;
mod routing;

use std::sync::Arc;

use scanroute_common::config::Config;
use scanroute_core::affinity::AffinityResolver;
use scanroute_core::dispatch::DispatchPlanner;
use scanroute_core::fleet::FleetSnapshotCache;
use scanroute_core::testing::{RecordingQueue, StaticCredentials, StaticFleet};

pub(crate) struct World {
    pub fleet: Arc<StaticFleet>,
    pub credentials: Arc<StaticCredentials>,
    pub queue: Arc<RecordingQueue>,
    pub planner: DispatchPlanner,
}

impl World {
    pub fn new(fleet: StaticFleet, config: Config) -> Self {
        let fleet = Arc::new(fleet);
        let credentials = Arc::new(StaticCredentials::default());
        let queue = Arc::new(RecordingQueue::default());

        let cache = FleetSnapshotCache::new(fleet.clone(), &config);
        let resolver = AffinityResolver::new(cache, credentials.clone(), &config);
        let planner = DispatchPlanner::new(resolver, queue.clone());

        Self {
            fleet,
            credentials,
            queue,
            planner,
        }
    }

    pub fn resolver(&self) -> &AffinityResolver {
        self.planner.resolver()
    }
}
