pub mod plan;
pub mod resolve;
pub mod state;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scanroute_common::config::{Config, DEFAULT_ZONE};
use scanroute_common::models::task::{Requester, TaskKind, TaskOptions, TaskRequest};
use scanroute_common::models::worker::WorkerId;

#[derive(Parser)]
#[command(name = "scanroute")]
#[command(about = "Decides where jobs against virtual machines and templates run.")]
pub struct CommandLine {
    /// JSON file holding resources, workers and credential validity
    #[arg(short, long, global = true, default_value = "inventory.json")]
    pub inventory: PathBuf,

    /// Zone for resources that are not linked to a management system
    #[arg(long, global = true, default_value = DEFAULT_ZONE)]
    pub default_zone: String,

    /// Worker that scans resources living on a repository
    #[arg(long, global = true)]
    pub default_worker: Option<String>,

    /// Gate delegated-credential workers on the host's credentials
    #[arg(long, global = true)]
    pub scan_via_host: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the power state and derived state of a resource
    #[command(alias = "s")]
    State { resource: String },
    /// List the workers eligible to scan a resource
    #[command(alias = "r")]
    Resolve { resource: String },
    /// Build the dispatch plan of a task against a resource
    #[command(alias = "p")]
    Plan(PlanArgs),
}

#[derive(Args)]
pub struct PlanArgs {
    /// Resource id or name
    pub resource: String,
    /// Task name, e.g. scan, start, create_snapshot
    pub task: TaskKind,

    /// Originating task to notify once the job finishes
    #[arg(long)]
    pub task_id: Option<u64>,

    #[arg(long, requires_all = ["group", "tenant"])]
    pub user: Option<u64>,
    #[arg(long, requires = "user")]
    pub group: Option<u64>,
    #[arg(long, requires = "user")]
    pub tenant: Option<u64>,

    /// User name passed to scan and sync
    #[arg(long)]
    pub userid: Option<String>,
    /// Snapshot to remove or revert to
    #[arg(long)]
    pub snapshot: Option<String>,
    /// Name of a new snapshot
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Include guest memory in a new snapshot
    #[arg(long)]
    pub memory: bool,

    /// Hand the plan to the queue instead of only printing it
    #[arg(long)]
    pub submit: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            default_zone: self.default_zone.clone(),
            default_worker: self.default_worker.as_deref().map(WorkerId::from),
            scan_via_management_system: !self.scan_via_host,
            ..Config::default()
        }
    }
}

impl PlanArgs {
    pub fn request(&self) -> TaskRequest {
        let mut request = TaskRequest::new(self.task).with_options(TaskOptions {
            userid: self.userid.clone(),
            snapshot: self.snapshot.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            memory: self.memory,
        });
        if let Some(task_id) = self.task_id {
            request = request.with_task(task_id);
        }
        if let (Some(user_id), Some(group_id), Some(tenant_id)) = (self.user, self.group, self.tenant)
        {
            request = request.with_requester(Requester {
                user_id,
                group_id,
                tenant_id,
            });
        }
        request
    }
}
