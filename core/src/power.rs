//! Power and connectivity state of a resource.
//!
//! Every write of the raw power state goes through [`set_raw_state`], which keeps
//! the previous state, the change time and the normalized state in step. The
//! remaining functions are pure derivations over the stored fields.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use scanroute_common::models::power::{PowerState, STATE_NEVER, STATE_UNKNOWN};
use scanroute_common::models::resource::Resource;

const CONNECTED: &str = "connected";
const TERMINATED: &str = "terminated";

/// Records a new raw power state reported by the provider.
///
/// Returns `false` without touching anything when `new_state` is empty or equal
/// to the current raw state.
pub fn set_raw_state(resource: &mut Resource, new_state: &str) -> bool {
    let changed = set_raw_state_at(&mut resource.power, new_state, Utc::now());
    if changed {
        debug!(
            "resource {} power state {:?} -> {:?}",
            resource, resource.power.previous, resource.power.raw
        );
    }
    changed
}

/// [`set_raw_state`] with an explicit change time.
pub fn set_raw_state_at(power: &mut PowerState, new_state: &str, now: DateTime<Utc>) -> bool {
    if new_state.is_empty() || power.raw.as_deref() == Some(new_state) {
        return false;
    }

    // All four fields are assigned together; nothing between can fail.
    power.previous = power.raw.take();
    power.changed_at = Some(now);
    power.raw = Some(new_state.to_string());
    power.normalized = Some(normalize(new_state).to_string());
    true
}

/// Maps a provider state onto the normalized vocabulary.
///
/// Only `"never"` survives; finer mappings are the business of whoever supplies
/// the raw states.
pub fn normalize(raw: &str) -> &'static str {
    if raw == STATE_NEVER { STATE_NEVER } else { STATE_UNKNOWN }
}

/// Flips the template flag, keeping the power state consistent with it.
///
/// A template is never powered, so becoming one records `"never"`. Turning a
/// template back into a resource resets `"never"` to `"unknown"`.
pub fn set_template(resource: &mut Resource, template: bool) -> bool {
    if resource.template == template {
        return false;
    }

    resource.template = template;
    let next = if template {
        STATE_NEVER.to_string()
    } else if resource.power.current() == STATE_NEVER {
        STATE_UNKNOWN.to_string()
    } else {
        resource.power.raw.clone().unwrap_or_default()
    };
    set_raw_state(resource, &next);
    true
}

/// Normalized label of a resource, see [`ResourceState::state_label`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateLabel {
    Archived,
    Orphaned,
    Template,
    Retired,
    Disconnected,
    Power(String),
}

impl StateLabel {
    pub fn as_str(&self) -> &str {
        match self {
            StateLabel::Archived => "archived",
            StateLabel::Orphaned => "orphaned",
            StateLabel::Template => "template",
            StateLabel::Retired => "retired",
            StateLabel::Disconnected => "disconnected",
            StateLabel::Power(state) => state,
        }
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived state predicates of a [`Resource`].
pub trait ResourceState {
    /// Normalized power state, lower-cased, `"unknown"` when absent.
    fn current_state(&self) -> String;
    /// Neither a management system nor a storage link.
    fn is_archived(&self) -> bool;
    /// No management system, but still on a storage.
    fn is_orphaned(&self) -> bool;
    fn is_active(&self) -> bool;
    /// A connection state is known and it is not `"connected"`.
    fn is_disconnected(&self) -> bool;
    fn is_connected_to_management_system(&self) -> bool;
    fn is_registered(&self) -> bool;
    fn is_terminated(&self) -> bool;
    fn is_runnable(&self) -> bool;
    /// Lives on a repository rather than a host.
    fn is_repository_resource(&self) -> bool;
    /// First match of archived, orphaned, template, retired, disconnected,
    /// then the lower-cased power state, then `"unknown"`.
    fn state_label(&self) -> StateLabel;
}

impl ResourceState for Resource {
    fn current_state(&self) -> String {
        self.power.current()
    }

    fn is_archived(&self) -> bool {
        self.management_system.is_none() && self.storage.is_none()
    }

    fn is_orphaned(&self) -> bool {
        self.management_system.is_none() && self.storage.is_some()
    }

    fn is_active(&self) -> bool {
        !self.is_archived() && !self.is_orphaned() && !self.retired && !self.template
    }

    fn is_disconnected(&self) -> bool {
        !self.is_connected_to_management_system()
    }

    fn is_connected_to_management_system(&self) -> bool {
        match self.connection_state.as_deref() {
            None => true,
            Some(state) => state == CONNECTED,
        }
    }

    fn is_registered(&self) -> bool {
        if self.template && self.management_system.is_none() {
            return false;
        }
        self.host.is_some()
    }

    fn is_terminated(&self) -> bool {
        self.current_state() == TERMINATED
    }

    fn is_runnable(&self) -> bool {
        self.host.is_some() && self.current_state() != STATE_NEVER
    }

    fn is_repository_resource(&self) -> bool {
        self.host.is_none()
    }

    fn state_label(&self) -> StateLabel {
        if self.is_archived() {
            StateLabel::Archived
        } else if self.is_orphaned() {
            StateLabel::Orphaned
        } else if self.template {
            StateLabel::Template
        } else if self.retired {
            StateLabel::Retired
        } else if self.is_disconnected() {
            StateLabel::Disconnected
        } else {
            match self.power.normalized.as_deref() {
                Some(state) => StateLabel::Power(state.to_lowercase()),
                None => StateLabel::Power(STATE_UNKNOWN.to_string()),
            }
        }
    }
}
