//! Repository sync: bring every source's checkout to the tip of its remote
//! branch.
//!
//! A missing checkout is cloned (single branch, no tags); an existing one is
//! fetched. Either way the branch is then checked out from `origin` with
//! `--force`, detached, so whatever state a previous (possibly interrupted)
//! run left in the working tree is discarded. Re-running is always safe.

use std::path::PathBuf;

use tracing::{error, info};

use crate::command::{run_strict, Invocation};
use crate::config::{SiteConfig, Source};
use crate::contract::CommandRunner;
use crate::error::{SiteBuildError, Stage};
use crate::layout::BuildLayout;

/// What the sync step had to do for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Fetched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedSource {
    pub name: String,
    pub action: SyncAction,
    pub checkout_dir: PathBuf,
}

pub fn clone_invocation(source: &Source, checkout_dir: &std::path::Path) -> Invocation {
    Invocation::new("git")
        .args(["clone", "--branch", source.branch(), "--single-branch", "--no-tags"])
        .arg(&source.repo)
        .arg(checkout_dir)
}

pub fn fetch_invocation(checkout_dir: &std::path::Path) -> Invocation {
    Invocation::new("git")
        .arg("-C")
        .arg(checkout_dir)
        .args(["fetch", "origin"])
}

pub fn checkout_invocation(source: &Source, checkout_dir: &std::path::Path) -> Invocation {
    Invocation::new("git")
        .arg("-C")
        .arg(checkout_dir)
        .args(["checkout", "--force"])
        .arg(format!("origin/{}", source.branch()))
}

/// Clone or fetch one source, then force-checkout its remote branch.
pub async fn sync_source<R>(
    source: &Source,
    layout: &BuildLayout,
    runner: &R,
) -> Result<SyncedSource, SiteBuildError>
where
    R: CommandRunner + ?Sized,
{
    let checkout_dir = layout.checkout_dir(&source.name);

    let action = if checkout_dir.exists() {
        info!(
            source = %source.name,
            path = %checkout_dir.display(),
            "[SYNC] Checkout present, fetching updates"
        );
        run_strict(runner, &fetch_invocation(&checkout_dir))
            .await
            .map_err(SiteBuildError::command(Stage::Sync))?;
        SyncAction::Fetched
    } else {
        info!(
            source = %source.name,
            repo = %source.repo,
            branch = source.branch(),
            path = %checkout_dir.display(),
            "[SYNC] No checkout yet, cloning"
        );
        run_strict(runner, &clone_invocation(source, &checkout_dir))
            .await
            .map_err(SiteBuildError::command(Stage::Sync))?;
        SyncAction::Cloned
    };

    run_strict(runner, &checkout_invocation(source, &checkout_dir))
        .await
        .map_err(SiteBuildError::command(Stage::Sync))?;

    info!(
        source = %source.name,
        branch = source.branch(),
        ?action,
        "[SYNC] Source is at origin/{}",
        source.branch()
    );

    Ok(SyncedSource {
        name: source.name.clone(),
        action,
        checkout_dir,
    })
}

/// Sync every configured source in name order. Stops at the first failure.
pub async fn sync_sources<R>(
    config: &SiteConfig,
    layout: &BuildLayout,
    runner: &R,
) -> Result<Vec<SyncedSource>, SiteBuildError>
where
    R: CommandRunner + ?Sized,
{
    BuildLayout::ensure_dir(layout.base_dir())
        .map_err(SiteBuildError::io(layout.base_dir()))?;

    let mut synced = Vec::new();
    for source in config.sources() {
        match sync_source(source, layout, runner).await {
            Ok(s) => synced.push(s),
            Err(e) => {
                error!(source = %source.name, error = %e, "[SYNC][ERROR] Sync failed");
                return Err(e);
            }
        }
    }
    info!(count = synced.len(), "[SYNC] All sources synced");
    Ok(synced)
}
