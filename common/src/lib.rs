//! # Scanroute Common
//!
//! Shared vocabulary of the workspace: the domain [`models`], the outbound
//! [`ports`] the core talks through, the [`error`] types and the runtime [`config`].
//!
//! Nothing in here performs IO. The core crate owns the decision logic and the
//! CLI crate owns the adapters.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
