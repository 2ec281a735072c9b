use std::future::Future;

use tracing::{debug, info, warn};

use super::progress::create_spinner;
use super::SessionContext;
use crate::config::Settings;
use crate::exec::CommandExecutor;
use crate::infra::{resolve, ResolvedNode};
use crate::pod::{BastionPods, PodPhase, PodStatus};
use crate::{BastionError, Result};

/// How the bastion pod for a finished session came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A pod left running by an earlier session was used and then removed.
    ReusedRunningPod,
    /// A fresh pod was created for this session.
    Provisioned,
}

/// One SSH session through a bastion pod.
pub struct Session<'a, E: ?Sized> {
    executor: &'a E,
    pods: BastionPods<'a, E>,
    ctx: SessionContext,
}

impl<'a, E> Session<'a, E>
where
    E: CommandExecutor + ?Sized,
{
    pub fn new(executor: &'a E, ctx: SessionContext, settings: &Settings) -> Self {
        Self {
            executor,
            pods: BastionPods::new(executor, &ctx.paths.kubeconfig, settings),
            ctx,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Resolve the node, bring up the bastion pod, attach the interactive
    /// session and remove the pod again.
    ///
    /// Once the pod status has been checked, the pod is deleted on every way
    /// out: success, error, or `shutdown` completing first.
    pub async fn run<S>(&self, shutdown: S) -> Result<SessionOutcome>
    where
        S: Future<Output = ()>,
    {
        let ctx = &self.ctx;
        debug!(
            owner = %ctx.owner,
            pod = %ctx.pod_name,
            public_key = ctx.public_key.is_some(),
            "starting session"
        );

        let node = resolve(self.executor, &ctx.node_name, ctx.infrastructure)
            .await
            .map_err(|e| BastionError::resolution(&ctx.node_name, e))?;

        let phase = match self.pods.check_status(&ctx.pod_name).await {
            PodStatus::Phase(phase) => phase,
            PodStatus::QueryFailed(reason) => {
                warn!(
                    pod = %ctx.pod_name,
                    %reason,
                    "cannot query bastion pod status, assuming it does not exist"
                );
                PodPhase::Absent
            }
        };

        let outcome = match phase {
            PodPhase::Running => {
                info!(pod = %ctx.pod_name, "bastion pod from an earlier session is running, reusing it");
                SessionOutcome::ReusedRunningPod
            }
            PodPhase::Completed => {
                info!(pod = %ctx.pod_name, "removing completed bastion pod");
                self.release().await;
                SessionOutcome::Provisioned
            }
            PodPhase::Absent | PodPhase::Pending | PodPhase::Failed => SessionOutcome::Provisioned,
        };

        let work = async {
            let key_file = match outcome {
                SessionOutcome::Provisioned => self.provision().await?,
                SessionOutcome::ReusedRunningPod => self.key_file_name(),
            };
            self.attach(&node, &key_file).await
        };

        let result = tokio::select! {
            result = work => result,
            _ = shutdown => {
                warn!(pod = %ctx.pod_name, "interrupted, cleaning up bastion pod");
                Err(BastionError::Interrupted)
            }
        };

        self.release().await;
        result.map(|()| outcome)
    }

    /// Create the pod and copy the key into it. Returns the key's file name
    /// inside the pod.
    async fn provision(&self) -> Result<String> {
        let pod = &self.ctx.pod_name;

        let spinner = create_spinner("Creating bastion pod...");
        let created = self.pods.create(pod).await;
        spinner.finish_and_clear();
        created?;

        let spinner = create_spinner("Waiting for bastion pod and copying key...");
        let copied = self.pods.copy_key(pod, &self.ctx.paths.key).await;
        spinner.finish_and_clear();
        let copy = copied?;

        if !copy.confirmed_running {
            warn!(
                pod = %pod,
                attempts = copy.attempts,
                "bastion pod was never reported running; the session may fail"
            );
        }

        Ok(copy.file_name)
    }

    async fn attach(&self, node: &ResolvedNode, key_file: &str) -> Result<()> {
        let command =
            self.pods
                .attach_command(&self.ctx.pod_name, node, &self.ctx.ssh_user, key_file);

        info!(pod = %self.ctx.pod_name, address = node.address(), "attaching interactive session");
        let code = self.executor.attach(&command).await?;
        if code != 0 {
            warn!(code, "interactive session exited with non-zero status");
        }
        Ok(())
    }

    /// Best-effort delete; failures are logged and otherwise ignored.
    async fn release(&self) {
        if let Err(e) = self.pods.delete(&self.ctx.pod_name).await {
            warn!(pod = %self.ctx.pod_name, error = %e, "failed to delete bastion pod");
        }
    }

    fn key_file_name(&self) -> String {
        self.ctx
            .paths
            .key
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "key".to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::exec::mock::{failure, MockExecutor};
    use crate::exec::CommandLine;
    use crate::infra::InfrastructureKind;
    use crate::session::SessionPaths;

    const NODE: &str = "ip-10-250-3-7.eu-west-1.compute.internal";

    fn is_status_query(cmd: &CommandLine) -> bool {
        cmd.args.iter().any(|a| a == "get")
    }

    fn has_arg(cmd: &CommandLine, arg: &str) -> bool {
        cmd.args.iter().any(|a| a == arg)
    }

    fn context(kind: InfrastructureKind) -> SessionContext {
        SessionContext::new(
            "alice",
            NODE,
            kind,
            "gardener",
            SessionPaths::from_dir(Path::new("/work")),
        )
    }

    fn settings() -> Settings {
        Settings {
            poll_interval_secs: 0,
            ..Settings::default()
        }
    }

    /// Cluster whose pod reports `phase` until a new one is created, then `Running`.
    fn cluster(phase: &'static str) -> MockExecutor {
        let created = Arc::new(AtomicBool::new(false));
        MockExecutor::with_handler(move |cmd| {
            if has_arg(cmd, "run") {
                created.store(true, Ordering::SeqCst);
            }
            if is_status_query(cmd) {
                let phase = if created.load(Ordering::SeqCst) { "Running" } else { phase };
                return Ok(phase.to_string());
            }
            Ok(String::new())
        })
    }

    async fn run(executor: &MockExecutor) -> Result<SessionOutcome> {
        Session::new(executor, context(InfrastructureKind::Aws), &settings())
            .run(std::future::pending())
            .await
    }

    #[tokio::test]
    async fn test_fresh_session() {
        let executor = cluster("");

        let outcome = run(&executor).await.unwrap();

        assert_eq!(outcome, SessionOutcome::Provisioned);
        let create = executor.position(" run -n default bastion-alice").unwrap();
        let copy = executor.position(" cp /work/key").unwrap();
        let attach = executor.position("attach: ").unwrap();
        let delete = executor.position(" delete ").unwrap();
        assert!(create < copy && copy < attach && attach < delete);
        assert_eq!(executor.count_matching(" delete "), 1);
        assert_eq!(executor.count_matching(NODE), 1);
    }

    #[tokio::test]
    async fn test_running_pod_is_reused_then_deleted_once() {
        let executor = cluster("Running");

        let outcome = run(&executor).await.unwrap();

        assert_eq!(outcome, SessionOutcome::ReusedRunningPod);
        assert_eq!(executor.count_matching(" run -n "), 0);
        assert_eq!(executor.count_matching(" cp "), 0);
        assert_eq!(executor.count_matching("attach: "), 1);
        assert_eq!(executor.count_matching(" delete "), 1);
        assert!(executor.position("attach: ").unwrap() < executor.position(" delete ").unwrap());
    }

    #[tokio::test]
    async fn test_completed_pod_is_deleted_before_create() {
        let executor = cluster("Succeeded");

        let outcome = run(&executor).await.unwrap();

        assert_eq!(outcome, SessionOutcome::Provisioned);
        let first_delete = executor.position(" delete ").unwrap();
        let create = executor.position(" run -n ").unwrap();
        assert!(first_delete < create);
        // Stale pod plus teardown.
        assert_eq!(executor.count_matching(" delete "), 2);
    }

    #[tokio::test]
    async fn test_pending_and_failed_pods_fall_through_to_create() {
        for phase in ["Pending", "Failed"] {
            let executor = cluster(phase);
            assert_eq!(run(&executor).await.unwrap(), SessionOutcome::Provisioned);
            assert_eq!(executor.count_matching(" run -n "), 1);
            assert_eq!(executor.count_matching(" delete "), 1);
        }
    }

    #[tokio::test]
    async fn test_status_query_failure_is_treated_as_absent() {
        let executor = MockExecutor::with_handler(|cmd| {
            if is_status_query(cmd) {
                Err(failure(cmd))
            } else {
                Ok(String::new())
            }
        });

        let outcome = run(&executor).await.unwrap();

        assert_eq!(outcome, SessionOutcome::Provisioned);
        assert_eq!(executor.count_matching(" run -n "), 1);
        // One initial check plus the bounded wait.
        assert_eq!(executor.count_matching(" get pod "), 16);
    }

    #[tokio::test]
    async fn test_resolution_failure_touches_no_pod() {
        let executor = MockExecutor::with_handler(|cmd| {
            if cmd.program == "az" {
                Err(failure(cmd))
            } else {
                Ok(String::new())
            }
        });

        let err = Session::new(&executor, context(InfrastructureKind::Azure), &settings())
            .run(std::future::pending())
            .await
            .unwrap_err();

        assert!(matches!(err, BastionError::Resolution { .. }));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(executor.count_matching("kubectl"), 0);
    }

    #[tokio::test]
    async fn test_create_failure_still_deletes_pod() {
        let executor = MockExecutor::with_handler(|cmd| {
            if has_arg(cmd, "run") {
                Err(failure(cmd))
            } else {
                Ok(String::new())
            }
        });

        let err = run(&executor).await.unwrap_err();

        assert!(matches!(err, BastionError::Execution { .. }));
        assert_eq!(executor.count_matching("attach: "), 0);
        assert_eq!(executor.count_matching(" delete "), 1);
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_fail_session() {
        let executor = MockExecutor::with_handler(|cmd| {
            if has_arg(cmd, "delete") {
                Err(failure(cmd))
            } else if is_status_query(cmd) {
                Ok("Running".to_string())
            } else {
                Ok(String::new())
            }
        });

        assert_eq!(run(&executor).await.unwrap(), SessionOutcome::ReusedRunningPod);
    }

    #[tokio::test]
    async fn test_non_zero_session_exit_is_not_an_error() {
        let executor = cluster("").attach_exit_code(255);
        assert_eq!(run(&executor).await.unwrap(), SessionOutcome::Provisioned);
    }

    #[tokio::test]
    async fn test_interrupt_during_provisioning_deletes_pod() {
        // Pod never runs, so the wait loop is sleeping when the signal arrives.
        let executor = MockExecutor::with_handler(|cmd| {
            if is_status_query(cmd) {
                Ok("Pending".to_string())
            } else {
                Ok(String::new())
            }
        });
        let settings = Settings {
            poll_interval_secs: 5,
            ..Settings::default()
        };

        let err = Session::new(&executor, context(InfrastructureKind::Aws), &settings)
            .run(tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap_err();

        assert!(matches!(err, BastionError::Interrupted));
        assert_eq!(err.exit_code(), 130);
        assert_eq!(executor.count_matching(" run -n "), 1);
        assert_eq!(executor.count_matching(" cp "), 0);
        assert_eq!(executor.count_matching("attach: "), 0);
        assert_eq!(executor.count_matching(" delete "), 1);
    }
}
