//! External command execution.
//!
//! Every interaction with the cluster and the provider CLIs goes through a
//! [`CommandExecutor`]. Commands are plain argv vectors; nothing is passed
//! through an intermediate shell on the local machine.

mod system;

#[cfg(test)]
pub mod mock;

use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;
use shell_escape::escape;

use crate::Result;

pub use system::SystemExecutor;

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Renders the command the way it would be typed in a POSIX shell.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", escape(Cow::Borrowed(self.program.as_str())))?;
        for arg in &self.args {
            write!(f, " {}", escape(Cow::Borrowed(arg.as_str())))?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion and return its stdout with trailing
    /// whitespace trimmed. A non-zero exit is an `Execution` error.
    async fn execute(&self, command: &CommandLine) -> Result<String>;

    /// Run `command` attached to this process's stdin/stdout/stderr and
    /// return its exit code once it finishes.
    async fn attach(&self, command: &CommandLine) -> Result<i32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_escapes_arguments() {
        let cmd = CommandLine::new("kubectl")
            .arg("exec")
            .args(["-it", "bastion-alice", "--", "sh", "-c", "cd /tmp && ssh host"]);

        assert_eq!(
            cmd.to_string(),
            "kubectl exec -it bastion-alice -- sh -c 'cd /tmp && ssh host'"
        );
    }

    #[test]
    fn test_builder_keeps_argument_order() {
        let cmd = CommandLine::new("az").arg("vm").args(vec!["list-ip-addresses".to_string()]);
        assert_eq!(cmd.program, "az");
        assert_eq!(cmd.args, vec!["vm", "list-ip-addresses"]);
    }
}
