use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Every task the planner knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Start,
    Stop,
    Suspend,
    Reset,
    ShutdownGuest,
    StandbyGuest,
    RebootGuest,
    Scan,
    Sync,
    Destroy,
    CreateSnapshot,
    RemoveSnapshot,
    RevertToSnapshot,
    CheckCompliance,
    RetireNow,
}

impl TaskKind {
    pub const ALL: [TaskKind; 15] = [
        TaskKind::Start,
        TaskKind::Stop,
        TaskKind::Suspend,
        TaskKind::Reset,
        TaskKind::ShutdownGuest,
        TaskKind::StandbyGuest,
        TaskKind::RebootGuest,
        TaskKind::Scan,
        TaskKind::Sync,
        TaskKind::Destroy,
        TaskKind::CreateSnapshot,
        TaskKind::RemoveSnapshot,
        TaskKind::RevertToSnapshot,
        TaskKind::CheckCompliance,
        TaskKind::RetireNow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Start => "start",
            TaskKind::Stop => "stop",
            TaskKind::Suspend => "suspend",
            TaskKind::Reset => "reset",
            TaskKind::ShutdownGuest => "shutdown_guest",
            TaskKind::StandbyGuest => "standby_guest",
            TaskKind::RebootGuest => "reboot_guest",
            TaskKind::Scan => "scan",
            TaskKind::Sync => "sync",
            TaskKind::Destroy => "destroy",
            TaskKind::CreateSnapshot => "create_snapshot",
            TaskKind::RemoveSnapshot => "remove_snapshot",
            TaskKind::RevertToSnapshot => "revert_to_snapshot",
            TaskKind::CheckCompliance => "check_compliance",
            TaskKind::RetireNow => "retire_now",
        }
    }

    pub fn is_power_operation(&self) -> bool {
        matches!(
            self,
            TaskKind::Start
                | TaskKind::Stop
                | TaskKind::Suspend
                | TaskKind::Reset
                | TaskKind::ShutdownGuest
                | TaskKind::StandbyGuest
                | TaskKind::RebootGuest
        )
    }

    /// Scan and sync run as jobs on scan workers.
    pub fn is_inspection(&self) -> bool {
        matches!(self, TaskKind::Scan | TaskKind::Sync)
    }

    /// Tasks a remote region may forward to the region owning the resource.
    pub fn is_remote_region(&self) -> bool {
        self.is_power_operation() || *self == TaskKind::RetireNow
    }

    /// Status queries that are accepted for resources without an owning host.
    pub fn tolerates_missing_host(&self) -> bool {
        matches!(self, TaskKind::CheckCompliance)
    }

    /// Name of the action a task performs.
    pub fn action(&self) -> &'static str {
        match self {
            TaskKind::RetireNow => "retire",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| DispatchError::UnsupportedTask(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who asked for the task. Merged into the job payload as attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: u64,
    pub group_id: u64,
    pub tenant_id: u64,
}

/// Task-specific inputs that end up in the job's argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOptions {
    /// Requesting user name, passed to scan and sync.
    pub userid: Option<String>,
    /// Snapshot selector for removal and revert.
    pub snapshot: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Include guest memory in a new snapshot.
    pub memory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub kind: TaskKind,
    /// Originating task to notify on completion.
    pub task_id: Option<TaskId>,
    pub requester: Option<Requester>,
    pub options: TaskOptions,
}

impl TaskRequest {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            task_id: None,
            requester: None,
            options: TaskOptions::default(),
        }
    }

    pub fn with_task(mut self, task_id: u64) -> Self {
        self.task_id = Some(TaskId(task_id));
        self
    }

    pub fn with_requester(mut self, requester: Requester) -> Self {
        self.requester = Some(requester);
        self
    }

    pub fn with_options(mut self, options: TaskOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_task_name() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.as_str().parse::<TaskKind>().unwrap(), kind);
        }
        assert_eq!("  Reboot_Guest ".parse::<TaskKind>().unwrap(), TaskKind::RebootGuest);
    }

    #[test]
    fn rejects_unknown_task_names() {
        let err = "defragment".parse::<TaskKind>().unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedTask(name) if name == "defragment"));
    }

    #[test]
    fn classifies_task_families() {
        let power: Vec<TaskKind> = TaskKind::ALL
            .into_iter()
            .filter(TaskKind::is_power_operation)
            .collect();
        assert_eq!(power.len(), 7);
        assert!(!TaskKind::Destroy.is_power_operation());

        assert!(TaskKind::Scan.is_inspection());
        assert!(TaskKind::Sync.is_inspection());
        assert!(!TaskKind::CreateSnapshot.is_inspection());

        assert!(TaskKind::RetireNow.is_remote_region());
        assert!(TaskKind::Suspend.is_remote_region());
        assert!(!TaskKind::Scan.is_remote_region());

        assert_eq!(TaskKind::RetireNow.action(), "retire");
        assert_eq!(TaskKind::Scan.action(), "scan");
    }
}
