use std::time::Duration;

use thiserror::Error;

use crate::models::resource::ResourceId;

/// Failure of a fleet snapshot refresh.
///
/// Cloneable so that a single refresh outcome can be handed to every caller
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FleetError {
    #[error("fleet refresh failed: {0}")]
    RefreshFailed(String),

    #[error("fleet refresh did not complete within {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("resource {resource} is not reachable: {reason}")]
    NotReachable { resource: ResourceId, reason: String },

    #[error("no eligible worker: {0}")]
    NoEligibleWorker(String),

    #[error("unsupported task: {0}")]
    UnsupportedTask(String),

    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error("failed to enqueue job: {0}")]
    Enqueue(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
