use super::{resolve_owner, PathArgs};
use crate::config::Settings;
use crate::exec::SystemExecutor;
use crate::pod::{BastionPods, PodPhase, PodStatus};
use crate::session::{create_spinner, pod_name_for};
use crate::Result;

/// Remove a bastion pod left behind by a session that was killed.
pub async fn execute(paths: PathArgs, owner: Option<String>) -> Result<()> {
    let settings = Settings::load()?;
    let executor = SystemExecutor;

    let owner = resolve_owner(&executor, owner).await?;
    let pod = pod_name_for(&owner);
    let kubeconfig = paths.session_paths().kubeconfig;
    let pods = BastionPods::new(&executor, &kubeconfig, &settings);

    if pods.check_status(&pod).await == PodStatus::Phase(PodPhase::Absent) {
        println!("No bastion pod {} found.", pod);
        return Ok(());
    }

    let spinner = create_spinner(&format!("Deleting bastion pod {}...", pod));
    let deleted = pods.delete(&pod).await;
    spinner.finish_and_clear();
    deleted?;

    println!("Bastion pod {} deleted.", pod);
    Ok(())
}
