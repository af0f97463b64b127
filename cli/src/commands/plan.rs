use anyhow::{Context, Result};
use scanroute_core::dispatch::DispatchPlanner;

use super::PlanArgs;
use crate::inventory::Inventory;

pub async fn plan(inventory: &Inventory, planner: &DispatchPlanner, args: &PlanArgs) -> Result<()> {
    let resource = inventory.resource(&args.resource)?;
    let request = args.request();

    if args.submit {
        let handle = planner.dispatch(resource, &request).await?;
        tracing::info!("submitted as {handle}");
        return Ok(());
    }

    let plan = planner.plan(resource, &request).await?;
    let rendered = serde_json::to_string_pretty(&plan).context("failed to encode plan")?;
    println!("{rendered}");
    Ok(())
}
