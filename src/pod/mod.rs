//! Bastion pod lifecycle.

mod lifecycle;

use std::fmt;

pub use lifecycle::{BastionPods, NAMESPACE};

/// Lifecycle phase of the bastion pod as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Absent,
    Pending,
    Running,
    Completed,
    Failed,
}

impl PodPhase {
    /// Parse `kubectl` jsonpath phase output. Empty output means no pod
    /// matched; with several matches the first one counts.
    pub fn parse(output: &str) -> Option<Self> {
        match output.split_whitespace().next() {
            None => Some(PodPhase::Absent),
            Some("Pending") => Some(PodPhase::Pending),
            Some("Running") => Some(PodPhase::Running),
            Some("Succeeded") | Some("Completed") => Some(PodPhase::Completed),
            Some("Failed") => Some(PodPhase::Failed),
            Some(_) => None,
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            PodPhase::Absent => "absent",
            PodPhase::Pending => "pending",
            PodPhase::Running => "running",
            PodPhase::Completed => "completed",
            PodPhase::Failed => "failed",
        };
        f.write_str(phase)
    }
}

/// Outcome of a status query. Query failures are reported, not raised, so
/// callers decide how to treat them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodStatus {
    Phase(PodPhase),
    QueryFailed(String),
}

impl PodStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, PodStatus::Phase(PodPhase::Running))
    }
}

impl fmt::Display for PodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PodStatus::Phase(phase) => write!(f, "{}", phase),
            PodStatus::QueryFailed(reason) => write!(f, "unknown ({})", reason),
        }
    }
}
