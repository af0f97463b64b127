//! # Outbound Ports
//!
//! Contracts for everything the core needs from the outside world. The core only
//! ever sees these traits; concrete implementations live with the adapters.
//!
//! * [`fleet::WorkerFleet`]: enumerates running workers (the expensive query).
//! * [`credentials::CredentialStore`]: credential validity per connection.
//! * [`queue::JobQueue`]: accepts a finished [`crate::models::plan::DispatchPlan`].

pub mod credentials;
pub mod fleet;
pub mod queue;
