//! # contract: the process-execution seam
//!
//! The pipeline never spawns processes directly. Every `git`, `make` and
//! `rsync` call goes through a [`CommandRunner`], so that:
//! - production code uses [`SystemRunner`](crate::command::SystemRunner),
//!   which spawns real children with a fixed search path;
//! - tests use the `mockall`-generated `MockCommandRunner` to script outcomes
//!   and record the exact sequence of invocations.
//!
//! A runner only reports what happened. Deciding whether that is fatal is the
//! caller's job (see [`FailurePolicy`](crate::command::FailurePolicy)).

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::command::{CommandOutcome, Invocation};

/// Executes one external program to completion.
///
/// Implementations must block (asynchronously) until the child exits and
/// must not apply timeouts or retries.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `invocation` and report how it ended. Spawn errors are reported as
    /// [`CommandOutcome::SpawnFailed`], never as a panic.
    async fn execute(&self, invocation: &Invocation) -> CommandOutcome;
}
