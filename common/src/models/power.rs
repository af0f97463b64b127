use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATE_UNKNOWN: &str = "unknown";
pub const STATE_NEVER: &str = "never";

/// Power state record of a resource.
///
/// `raw`, `previous` and `changed_at` move together: every effective change of
/// `raw` records the prior value and the change time, and recomputes `normalized`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerState {
    /// Provider-reported state string.
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub normalized: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub changed_at: Option<DateTime<Utc>>,
}

impl PowerState {
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Normalized state, lower-cased, `"unknown"` when absent.
    pub fn current(&self) -> String {
        self.normalized
            .as_deref()
            .unwrap_or(STATE_UNKNOWN)
            .to_lowercase()
    }
}
