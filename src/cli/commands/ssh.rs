use std::path::PathBuf;

use super::{resolve_owner, PathArgs};
use crate::config::Settings;
use crate::exec::SystemExecutor;
use crate::infra::{load_kind, InfrastructureKind};
use crate::pod::NAMESPACE;
use crate::session::{shutdown_signal, Session, SessionContext, SessionOutcome};
use crate::{BastionError, Result};

pub struct SshOptions {
    pub node: String,
    pub paths: PathArgs,
    pub infra: Option<InfrastructureKind>,
    pub owner: Option<String>,
    pub user: Option<String>,
    pub public_key: Option<PathBuf>,
}

pub async fn execute(options: SshOptions) -> Result<()> {
    let settings = Settings::load()?;
    let executor = SystemExecutor;

    let paths = options.paths.session_paths();
    paths.ensure_exist()?;

    // An explicit provider skips the Terraform lookup.
    let infra = match options.infra {
        Some(kind) => kind,
        None => load_kind(&paths.terraform_main)
            .map_err(|e| BastionError::resolution(&options.node, e))?,
    };

    let owner = resolve_owner(&executor, options.owner).await?;
    let ssh_user = options.user.unwrap_or_else(|| settings.ssh_user.clone());

    let mut ctx = SessionContext::new(&owner, &options.node, infra, &ssh_user, paths);
    if let Some(path) = options.public_key {
        let public_key = std::fs::read(&path)
            .map_err(|_| BastionError::PathNotFound(path.display().to_string()))?;
        ctx = ctx.with_public_key(public_key);
    }

    let session = Session::new(&executor, ctx, &settings);
    let ctx = session.context();
    println!(
        "Your bastion pod is {} in namespace {}.",
        ctx.pod_name, NAMESPACE
    );
    println!("  Node: {} ({})", ctx.node_name, ctx.infrastructure);
    println!("  Owner: {}", ctx.owner);

    let outcome = session.run(shutdown_signal()).await?;

    match outcome {
        SessionOutcome::ReusedRunningPod => {
            println!("Session on existing bastion pod ended, pod removed.")
        }
        SessionOutcome::Provisioned => println!("Session ended, bastion pod removed."),
    }

    Ok(())
}
