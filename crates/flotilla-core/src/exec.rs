//! Remote-execution collaborator interface.
//!
//! The mechanics of reaching a target (SSH, agent channel) are out of
//! scope; facades fan out over this trait and aggregate the results.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::tag::Tag;

/// Captured output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code.
    pub code: i32,
}

/// Executes a command on one target entity (machine or unit).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `commands` on the target, bounded by `timeout`.
    async fn run(&self, target: &Tag, commands: &str, timeout: Duration) -> Result<ExecOutput, Error>;
}
