use std::path::{Path, PathBuf};

use tracing::debug;

use crate::exec::{CommandExecutor, CommandLine};
use crate::infra::InfrastructureKind;
use crate::{BastionError, Result};

const POD_NAME_PREFIX: &str = "bastion-";

/// Local files a session reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub key: PathBuf,
    pub kubeconfig: PathBuf,
    pub terraform_main: PathBuf,
}

impl SessionPaths {
    /// Standard layout of a working directory: `key`, `kubeconfig.yaml` and
    /// `terraform/main.tf`.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            key: dir.join("key"),
            kubeconfig: dir.join("kubeconfig.yaml"),
            terraform_main: dir.join("terraform").join("main.tf"),
        }
    }

    /// Fail early on inputs `kubectl` would otherwise reject mid-session.
    pub fn ensure_exist(&self) -> Result<()> {
        for path in [&self.key, &self.kubeconfig] {
            if !path.is_file() {
                return Err(BastionError::PathNotFound(path.display().to_string()));
            }
        }
        Ok(())
    }
}

/// Everything one SSH session needs, derived once per invocation.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub owner: String,
    pub pod_name: String,
    pub node_name: String,
    pub infrastructure: InfrastructureKind,
    pub ssh_user: String,
    pub paths: SessionPaths,
    /// Only referenced, never sent anywhere.
    pub public_key: Option<Vec<u8>>,
}

impl SessionContext {
    pub fn new(
        owner: &str,
        node_name: &str,
        infrastructure: InfrastructureKind,
        ssh_user: &str,
        paths: SessionPaths,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            pod_name: pod_name_for(owner),
            node_name: node_name.to_string(),
            infrastructure,
            ssh_user: ssh_user.to_string(),
            paths,
            public_key: None,
        }
    }

    pub fn with_public_key(mut self, public_key: Vec<u8>) -> Self {
        debug!(bytes = public_key.len(), "public key loaded");
        self.public_key = Some(public_key);
        self
    }
}

/// Bastion pod name for `owner`. Characters Kubernetes does not accept in
/// object names are replaced with `-`.
pub fn pod_name_for(owner: &str) -> String {
    let owner: String = owner
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '.' => c,
            _ => '-',
        })
        .collect();
    format!("{}{}", POD_NAME_PREFIX, owner.trim_matches(['-', '.']))
}

/// Identity of the invoking user, from `whoami`.
pub async fn current_owner<E>(executor: &E) -> Result<String>
where
    E: CommandExecutor + ?Sized,
{
    let owner = executor.execute(&CommandLine::new("whoami")).await?;
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(BastionError::Config(
            "Cannot determine current user; pass --owner".to_string(),
        ));
    }
    Ok(owner.to_string())
}
