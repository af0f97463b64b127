//! End-to-end scenarios across the fleet cache, the resolver and the planner.

#[cfg(test)]
mod scenarios;
