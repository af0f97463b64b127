//! # Domain Models
//!
//! * [`resource::Resource`]: the virtual machine or template being scanned, with
//!   its host, management system, storage and [`resource::Volume`] links.
//! * [`power::PowerState`]: the raw/normalized power state record of a resource.
//! * [`worker::Worker`]: a scan worker and its declared capabilities.
//! * [`fleet::FleetSnapshot`]: point-in-time view of the running workers.
//! * [`task::TaskRequest`] and [`plan::DispatchPlan`]: what is asked, and how the
//!   resulting job is addressed.

pub mod fleet;
pub mod plan;
pub mod power;
pub mod resource;
pub mod task;
pub mod worker;
