use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resource::{ConnectionId, ResourceId};
use super::task::{Requester, TaskId};
use super::worker::WorkerId;

/// Queue service a job is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Handled by the management system's operations workers.
    EmsOperations,
    /// Handled by scan workers.
    Smartstate,
    /// Plain queue entry, no service or affinity routing.
    Direct,
}

impl Transport {
    pub fn service(&self) -> Option<&'static str> {
        match self {
            Transport::EmsOperations => Some("ems_operations"),
            Transport::Smartstate => Some("smartstate"),
            Transport::Direct => None,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service().unwrap_or("direct"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchTarget {
    /// Whichever process serves the transport picks the job up.
    Queue,
    /// Addressed to the resource. The queue picks one of `candidates`.
    Resolver { candidates: Vec<WorkerId> },
    /// Pinned to one worker.
    Worker { id: WorkerId },
}

/// Who to notify, and with what, once the job finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub class_name: String,
    pub instance_id: u64,
    pub method_name: String,
    pub args: Vec<Value>,
}

/// Fully addressed job, ready for the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPlan {
    pub transport: Transport,
    pub target: DispatchTarget,
    /// Management system the job should stay close to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<ConnectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    pub class_name: String,
    pub instance_id: ResourceId,
    pub method_name: String,
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,
    #[serde(default, flatten, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Requester>,
}

impl DispatchPlan {
    pub fn service(&self) -> Option<&'static str> {
        self.transport.service()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
