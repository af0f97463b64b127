use anyhow::Result;
use scanroute_core::power::ResourceState;

use crate::inventory::Inventory;
use crate::terminal::print;

const KEY_WIDTH: usize = 14;

pub fn state(inventory: &Inventory, key: &str) -> Result<()> {
    let resource = inventory.resource(key)?;
    let power = &resource.power;

    print::header(&format!("state of {}", resource.name));
    print::aligned_line("label", KEY_WIDTH, resource.state_label());
    print::aligned_line("current", KEY_WIDTH, resource.current_state());
    print::aligned_line("raw", KEY_WIDTH, power.raw().unwrap_or("-"));
    print::aligned_line("previous", KEY_WIDTH, power.previous().unwrap_or("-"));
    let changed_at = power
        .changed_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    print::aligned_line("changed at", KEY_WIDTH, changed_at);

    let predicates = [
        ("active", resource.is_active()),
        ("archived", resource.is_archived()),
        ("orphaned", resource.is_orphaned()),
        ("disconnected", resource.is_disconnected()),
        ("registered", resource.is_registered()),
        ("runnable", resource.is_runnable()),
        ("terminated", resource.is_terminated()),
        ("repository", resource.is_repository_resource()),
    ];
    for (name, value) in predicates {
        print::aligned_line(name, KEY_WIDTH, print::flag(value));
    }
    Ok(())
}
