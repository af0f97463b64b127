mod commands;
mod inventory;
mod terminal;

use std::sync::Arc;

use commands::{CommandLine, Commands, plan, resolve, state};
use inventory::{Inventory, StdoutQueue};
use scanroute_core::affinity::AffinityResolver;
use scanroute_core::dispatch::DispatchPlanner;
use scanroute_core::fleet::FleetSnapshotCache;
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);

    let cfg = commands.config();
    let inventory = Arc::new(Inventory::load(&commands.inventory)?);

    let cache = FleetSnapshotCache::new(inventory.clone(), &cfg);
    let resolver = AffinityResolver::new(cache, inventory.clone(), &cfg);

    match &commands.command {
        Commands::State { resource } => state::state(&inventory, resource),
        Commands::Resolve { resource } => resolve::resolve(&inventory, &resolver, resource).await,
        Commands::Plan(args) => {
            let queue = Arc::new(StdoutQueue::default());
            let planner = DispatchPlanner::new(resolver, queue);
            plan::plan(&inventory, &planner, args).await
        }
    }
}
