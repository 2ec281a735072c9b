use super::{resolve_owner, PathArgs};
use crate::config::Settings;
use crate::exec::SystemExecutor;
use crate::pod::{BastionPods, PodStatus, NAMESPACE};
use crate::session::pod_name_for;
use crate::{BastionError, Result};

pub async fn execute(paths: PathArgs, owner: Option<String>) -> Result<()> {
    let settings = Settings::load()?;
    let executor = SystemExecutor;

    let owner = resolve_owner(&executor, owner).await?;
    let pod = pod_name_for(&owner);
    let kubeconfig = paths.session_paths().kubeconfig;

    let status = BastionPods::new(&executor, &kubeconfig, &settings)
        .check_status(&pod)
        .await;

    println!("Bastion pod {} in namespace {}: {}", pod, NAMESPACE, status);

    // A status command that cannot read the status has failed.
    match status {
        PodStatus::Phase(_) => Ok(()),
        PodStatus::QueryFailed(reason) => Err(BastionError::execution("kubectl get pod", reason)),
    }
}
