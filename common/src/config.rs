use std::time::Duration;

use crate::models::worker::WorkerId;

pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ZONE: &str = "default";

#[derive(Debug, Clone)]
pub struct Config {
    /// How long a captured fleet snapshot is served before the next read refreshes it.
    pub snapshot_ttl: Duration,
    /// Upper bound a caller waits for an in-flight fleet refresh.
    pub refresh_timeout: Duration,
    /// Zone used for resources that are not linked to a management system.
    pub default_zone: String,
    /// Worker that scans resources living on a repository (no host, no provider).
    pub default_worker: Option<WorkerId>,
    /// When set, workers needing delegated credentials are gated on the
    /// management system's credentials. Otherwise on the host's.
    pub scan_via_management_system: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_ttl: DEFAULT_SNAPSHOT_TTL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            default_zone: DEFAULT_ZONE.to_string(),
            default_worker: None,
            scan_via_management_system: true,
        }
    }
}
