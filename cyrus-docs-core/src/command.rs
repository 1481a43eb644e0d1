//! External process execution.
//!
//! Every step of the site build is an external program (`git`, `make`,
//! `rsync`). This module renders those calls as an [`Invocation`], runs them
//! through a [`CommandRunner`](crate::contract::CommandRunner) and decodes the
//! exit status into a single [`CommandOutcome`]. Whether a given outcome is
//! fatal is decided by the caller's [`FailurePolicy`], not by the runner.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::contract::CommandRunner;

/// Search path given to every child process, regardless of the caller's own
/// `PATH`.
pub const SAFE_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// A program plus its argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// The invocation as an operator would type it.
    pub fn command_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// `path` with a trailing `/`, which makes rsync copy a directory's contents
/// instead of the directory itself.
pub fn with_trailing_slash(path: &Path) -> OsString {
    let mut s = path.as_os_str().to_os_string();
    if !s.to_string_lossy().ends_with('/') {
        s.push("/");
    }
    s
}

/// How a child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Exited on its own with a non-zero code.
    NonZeroExit(i32),
    /// Terminated by a signal.
    Signaled { signal: i32, core_dumped: bool },
    /// Never started: program missing, not executable, or an OS-level error.
    SpawnFailed(String),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success)
    }
}

impl From<ExitStatus> for CommandOutcome {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            return CommandOutcome::Success;
        }
        if let Some(code) = status.code() {
            return CommandOutcome::NonZeroExit(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            CommandOutcome::Signaled {
                signal: status.signal().unwrap_or(0),
                core_dumped: status.core_dumped(),
            }
        }
        #[cfg(not(unix))]
        {
            CommandOutcome::NonZeroExit(-1)
        }
    }
}

/// Which outcomes the caller can live with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Anything but success is fatal.
    Strict,
    /// A non-zero exit is accepted; signals and spawn failures are not.
    Tolerant,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("failed to execute `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("`{command}` died with signal {signal}, {}", core_note(.core_dumped))]
    Signaled {
        command: String,
        signal: i32,
        core_dumped: bool,
    },

    #[error("`{command}` exited with value {code}")]
    NonZeroExit { command: String, code: i32 },
}

fn core_note(core_dumped: &bool) -> &'static str {
    if *core_dumped {
        "with coredump"
    } else {
        "without coredump"
    }
}

/// Apply `policy` to an outcome. Accepted outcomes are passed back so a
/// tolerant caller can still inspect the exit code.
pub fn check_outcome(
    invocation: &Invocation,
    outcome: CommandOutcome,
    policy: FailurePolicy,
) -> Result<CommandOutcome, CommandError> {
    let command = invocation.command_line();
    match outcome {
        CommandOutcome::Success => Ok(outcome),
        CommandOutcome::NonZeroExit(code) => match policy {
            FailurePolicy::Tolerant => {
                debug!(command = %command, code, "Ignoring non-zero exit");
                Ok(outcome)
            }
            FailurePolicy::Strict => Err(CommandError::NonZeroExit { command, code }),
        },
        CommandOutcome::Signaled {
            signal,
            core_dumped,
        } => Err(CommandError::Signaled {
            command,
            signal,
            core_dumped,
        }),
        CommandOutcome::SpawnFailed(reason) => Err(CommandError::Spawn { command, reason }),
    }
}

/// Print the command line, run it, and judge the outcome under `policy`.
pub async fn run_command<R>(
    runner: &R,
    invocation: &Invocation,
    policy: FailurePolicy,
) -> Result<CommandOutcome, CommandError>
where
    R: CommandRunner + ?Sized,
{
    println!("$ {invocation}");
    info!(command = %invocation, ?policy, "Running command");
    let outcome = runner.execute(invocation).await;
    match check_outcome(invocation, outcome, policy) {
        Ok(outcome) => {
            debug!(command = %invocation, ?outcome, "Command finished");
            Ok(outcome)
        }
        Err(e) => {
            error!(command = %invocation, error = %e, "Command failed");
            Err(e)
        }
    }
}

/// Fatal on anything but success. Used for every step of the site build.
pub async fn run_strict<R>(runner: &R, invocation: &Invocation) -> Result<(), CommandError>
where
    R: CommandRunner + ?Sized,
{
    run_command(runner, invocation, FailurePolicy::Strict)
        .await
        .map(|_| ())
}

/// Like [`run_strict`], but a program that exits non-zero is not an error.
pub async fn run_tolerant<R>(
    runner: &R,
    invocation: &Invocation,
) -> Result<CommandOutcome, CommandError>
where
    R: CommandRunner + ?Sized,
{
    run_command(runner, invocation, FailurePolicy::Tolerant).await
}

/// Runs invocations as real child processes. Output is streamed to the
/// terminal; stdin is closed.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

#[async_trait::async_trait]
impl CommandRunner for SystemRunner {
    async fn execute(&self, invocation: &Invocation) -> CommandOutcome {
        let status = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .env("PATH", SAFE_PATH)
            .stdin(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) => CommandOutcome::from(status),
            Err(e) => CommandOutcome::SpawnFailed(e.to_string()),
        }
    }
}
