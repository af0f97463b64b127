use anyhow::Result;
use scanroute_common::models::worker::Worker;
use scanroute_core::affinity::AffinityResolver;

use crate::inventory::Inventory;
use crate::terminal::print;

pub async fn resolve(inventory: &Inventory, resolver: &AffinityResolver, key: &str) -> Result<()> {
    let resource = inventory.resource(key)?;
    let resolution = resolver.resolve(resource).await?;

    print::header(&format!("workers for {}", resource.name));
    print::aligned_line("zone", 7, resolver.zone_of(resource));
    print::aligned_line("message", 7, resolution.message);

    print_workers("active candidates", &resolution.active);
    print_workers("all candidates", &resolution.all);
    Ok(())
}

fn print_workers(title: &str, workers: &[Worker]) {
    print::header(title);
    if workers.is_empty() {
        print::no_results("none");
        return;
    }
    for (idx, worker) in workers.iter().enumerate() {
        print::tree_head(idx, worker.id.as_str());
        let capabilities = worker
            .capabilities
            .iter()
            .map(|capability| capability.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        print::as_tree_one_level(&[
            ("name".to_string(), worker.name.clone()),
            ("zone".to_string(), worker.zone.clone()),
            ("caps".to_string(), capabilities),
        ]);
    }
}
