//! End-to-end SSH session through a bastion pod.

mod context;
mod orchestrator;
mod progress;
mod signal;

pub use context::{current_owner, pod_name_for, SessionContext, SessionPaths};
pub use orchestrator::{Session, SessionOutcome};
pub use progress::create_spinner;
pub use signal::shutdown_signal;
