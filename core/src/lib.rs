//! # Scanroute core
//!
//! Decides where jobs against virtual machines and templates should run.
//!
//! * **[`power`]**: Power state tracking and the derived state label of a resource.
//! * **[`fleet`]**: Shared, single-flight cache of the running worker fleet.
//! * **[`affinity`]**: Picks the workers allowed to scan a resource.
//! * **[`dispatch`]**: Turns a task request into a queue-ready plan.
//!
//! Everything outside the process (fleet discovery, credentials, the job queue)
//! is reached through the ports in `scanroute_common::ports`.

pub mod affinity;
pub mod dispatch;
pub mod fleet;
pub mod power;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
