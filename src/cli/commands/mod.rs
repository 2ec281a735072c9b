pub mod cleanup;
pub mod config;
pub mod resolve;
pub mod ssh;
pub mod status;

use std::path::PathBuf;

use clap::Args;

use crate::exec::CommandExecutor;
use crate::session::{current_owner, SessionPaths};
use crate::Result;

/// Location of the key, kubeconfig and Terraform files.
#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// Directory holding `key`, `kubeconfig.yaml` and `terraform/main.tf`
    #[arg(short, long, env = "KUBE_BASTION_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// SSH private key for the node (default: <DIR>/key)
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Kubeconfig of the cluster hosting the bastion pod (default: <DIR>/kubeconfig.yaml)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Terraform root module naming the provider (default: <DIR>/terraform/main.tf)
    #[arg(long)]
    pub terraform_main: Option<PathBuf>,
}

impl PathArgs {
    pub fn session_paths(&self) -> SessionPaths {
        let defaults = SessionPaths::from_dir(&self.dir);
        SessionPaths {
            key: self.key.clone().unwrap_or(defaults.key),
            kubeconfig: self.kubeconfig.clone().unwrap_or(defaults.kubeconfig),
            terraform_main: self.terraform_main.clone().unwrap_or(defaults.terraform_main),
        }
    }
}

/// Use the given owner or ask the system who is running us.
pub async fn resolve_owner<E>(executor: &E, owner: Option<String>) -> Result<String>
where
    E: CommandExecutor + ?Sized,
{
    match owner {
        Some(owner) => Ok(owner),
        None => current_owner(executor).await,
    }
}
