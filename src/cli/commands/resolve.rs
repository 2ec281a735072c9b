use super::PathArgs;
use crate::exec::SystemExecutor;
use crate::infra::{load_kind, resolve, InfrastructureKind};
use crate::{BastionError, Result};

/// Print the address a session would connect to.
pub async fn execute(
    node: String,
    paths: PathArgs,
    infra: Option<InfrastructureKind>,
) -> Result<()> {
    let infra = match infra {
        Some(kind) => kind,
        None => load_kind(&paths.session_paths().terraform_main)
            .map_err(|e| BastionError::resolution(&node, e))?,
    };

    let resolved = resolve(&SystemExecutor, &node, infra)
        .await
        .map_err(|e| BastionError::resolution(&node, e))?;

    println!("{}", resolved.address());
    if let Some(instance_id) = resolved.instance_id() {
        println!("  Instance ID: {}", instance_id);
    }

    Ok(())
}
