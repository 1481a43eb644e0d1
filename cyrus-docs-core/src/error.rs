//! Errors from a site build run, tagged with the stage that failed.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::command::CommandError;

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sync,
    Build,
    Assemble,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Sync => "sync",
            Stage::Build => "build",
            Stage::Assemble => "assemble",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SiteBuildError {
    #[error("{stage} failed: {source}")]
    Command {
        stage: Stage,
        #[source]
        source: CommandError,
    },

    #[error("cannot create {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SiteBuildError {
    pub fn command(stage: Stage) -> impl FnOnce(CommandError) -> Self {
        move |source| SiteBuildError::Command { stage, source }
    }

    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| SiteBuildError::Io { path, source }
    }

    /// Stage of a command failure; `None` for filesystem errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SiteBuildError::Command { stage, .. } => Some(*stage),
            SiteBuildError::Io { .. } => None,
        }
    }
}
