use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

use shell_escape::escape;
use tracing::{debug, info, warn};

use super::{PodPhase, PodStatus};
use crate::config::Settings;
use crate::exec::{CommandExecutor, CommandLine};
use crate::infra::ResolvedNode;
use crate::{BastionError, Result};

/// Namespace the bastion pod lives in.
pub const NAMESPACE: &str = "default";

/// Directory inside the pod the key is copied to.
const POD_KEY_DIR: &str = "/tmp";

/// Result of [`BastionPods::copy_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCopy {
    /// Whether the pod was seen running before the copy.
    pub confirmed_running: bool,
    /// Status checks spent waiting.
    pub attempts: u32,
    /// File name of the key inside the pod's key directory.
    pub file_name: String,
}

/// Drives bastion pods on one cluster through `kubectl`.
pub struct BastionPods<'a, E: ?Sized> {
    executor: &'a E,
    kubeconfig: PathBuf,
    image: String,
    lifetime_secs: u64,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl<'a, E> BastionPods<'a, E>
where
    E: CommandExecutor + ?Sized,
{
    pub fn new(executor: &'a E, kubeconfig: &Path, settings: &Settings) -> Self {
        Self {
            executor,
            kubeconfig: kubeconfig.to_path_buf(),
            image: settings.image.clone(),
            lifetime_secs: settings.pod_lifetime_secs,
            poll_attempts: settings.poll_attempts,
            poll_interval: settings.poll_interval(),
        }
    }

    fn kubectl(&self) -> CommandLine {
        CommandLine::new("kubectl").arg(format!("--kubeconfig={}", self.kubeconfig.display()))
    }

    pub async fn check_status(&self, pod: &str) -> PodStatus {
        let command = self.kubectl().args([
            "-n".to_string(),
            NAMESPACE.to_string(),
            "get".to_string(),
            "pod".to_string(),
            "-l".to_string(),
            format!("run={}", pod),
            "--output=jsonpath={.items..status.phase}".to_string(),
        ]);

        let output = match self.executor.execute(&command).await {
            Ok(output) => output,
            Err(e) => return PodStatus::QueryFailed(e.to_string()),
        };

        match PodPhase::parse(&output) {
            Some(phase) => {
                debug!(pod, %phase, "bastion pod status");
                PodStatus::Phase(phase)
            }
            None => PodStatus::QueryFailed(format!("unrecognized pod phase {:?}", output)),
        }
    }

    /// Start a pod that sleeps for the configured lifetime, then completes.
    pub async fn create(&self, pod: &str) -> Result<()> {
        info!(pod, image = %self.image, "creating bastion pod");

        let command = self.kubectl().args([
            "run".to_string(),
            "-n".to_string(),
            NAMESPACE.to_string(),
            pod.to_string(),
            format!("--image={}", self.image),
            "--restart=Never".to_string(),
            "--".to_string(),
            "sleep".to_string(),
            self.lifetime_secs.to_string(),
        ]);

        self.executor.execute(&command).await?;
        Ok(())
    }

    /// Wait for the pod to run, then copy `key` into it. The copy is
    /// attempted even when the pod was never seen running.
    pub async fn copy_key(&self, pod: &str, key: &Path) -> Result<KeyCopy> {
        let file_name = key
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| BastionError::PathNotFound(key.display().to_string()))?;

        let mut attempts = 0;
        let mut confirmed_running = false;

        while attempts < self.poll_attempts {
            attempts += 1;
            let status = self.check_status(pod).await;
            if status.is_running() {
                confirmed_running = true;
                break;
            }
            debug!(pod, attempt = attempts, %status, "waiting for bastion pod");
            tokio::time::sleep(self.poll_interval).await;
        }

        if !confirmed_running {
            warn!(
                pod,
                attempts, "bastion pod not running after all status checks, copying key anyway"
            );
        }

        let command = self.kubectl().args([
            "cp".to_string(),
            key.display().to_string(),
            format!("{}/{}:{}/{}", NAMESPACE, pod, POD_KEY_DIR, file_name),
        ]);
        self.executor.execute(&command).await?;
        info!(pod, key = %key.display(), "copied key to bastion pod");

        Ok(KeyCopy {
            confirmed_running,
            attempts,
            file_name,
        })
    }

    /// Force-delete the pod without a grace period.
    pub async fn delete(&self, pod: &str) -> Result<()> {
        info!(pod, "deleting bastion pod");

        let command = self.kubectl().args([
            "delete".to_string(),
            "-n".to_string(),
            NAMESPACE.to_string(),
            format!("pod/{}", pod),
            "--grace-period=0".to_string(),
            "--force".to_string(),
        ]);

        self.executor.execute(&command).await?;
        Ok(())
    }

    /// Interactive `kubectl exec` that SSHes from the pod to `node` and
    /// leaves a pod shell open once the SSH session ends.
    pub fn attach_command(
        &self,
        pod: &str,
        node: &ResolvedNode,
        ssh_user: &str,
        key_file: &str,
    ) -> CommandLine {
        let prompt = format!("{}^_^ ", pod);
        let target = format!("{}@{}", ssh_user, node.address());
        let script = format!(
            "apk add --no-cache openssh-client && export PS1={prompt} && cd {dir} && chmod 600 {key} && ssh -i {key} -o StrictHostKeyChecking=no {target} && sh",
            prompt = escape(Cow::Owned(prompt)),
            dir = POD_KEY_DIR,
            key = escape(Cow::Borrowed(key_file)),
            target = escape(Cow::Owned(target)),
        );

        self.kubectl().args([
            "exec".to_string(),
            "-it".to_string(),
            "-n".to_string(),
            NAMESPACE.to_string(),
            pod.to_string(),
            "--".to_string(),
            "sh".to_string(),
            "-c".to_string(),
            script,
        ])
    }
}
