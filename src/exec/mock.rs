//! Recording executor for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommandExecutor, CommandLine};
use crate::{BastionError, Result};

type Handler = Box<dyn Fn(&CommandLine) -> Result<String> + Send + Sync>;

pub struct MockExecutor {
    handler: Handler,
    attach_code: i32,
    calls: Mutex<Vec<String>>,
}

impl MockExecutor {
    /// Every command succeeds with empty output.
    pub fn new() -> Self {
        Self::with_handler(|_| Ok(String::new()))
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&CommandLine) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            attach_code: 0,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn attach_exit_code(mut self, code: i32) -> Self {
        self.attach_code = code;
        self
    }

    /// Rendered commands in the order they ran. Interactive commands are
    /// prefixed with `attach: `.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    pub fn position(&self, needle: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.contains(needle))
    }
}

/// Shorthand for a failed command in handlers.
pub fn failure(command: &CommandLine) -> BastionError {
    BastionError::execution(command, "exit status: 1")
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(&self, command: &CommandLine) -> Result<String> {
        self.calls.lock().unwrap().push(command.to_string());
        (self.handler)(command)
    }

    async fn attach(&self, command: &CommandLine) -> Result<i32> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("attach: {}", command));
        Ok(self.attach_code)
    }
}
