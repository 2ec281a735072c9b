use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{CommandExecutor, CommandLine};
use crate::{BastionError, Result};

/// Runs commands as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, command: &CommandLine) -> Result<String> {
        debug!(%command, "running command");

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BastionError::execution(command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BastionError::execution(
                command,
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim_end().to_string())
    }

    async fn attach(&self, command: &CommandLine) -> Result<i32> {
        debug!(%command, "attaching interactive command");

        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| BastionError::execution(command, e))?;

        // Killed by a signal: report it the way a shell would.
        Ok(status.code().unwrap_or(-1))
    }
}
