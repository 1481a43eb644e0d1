//! Optional last step: push the assembled site to its web host.

use tracing::info;

use crate::command::{run_strict, with_trailing_slash, Invocation};
use crate::contract::CommandRunner;
use crate::error::{SiteBuildError, Stage};
use crate::layout::BuildLayout;

/// `rsync -av <site>/ <target>`. The target is passed through untouched, so
/// it may be a local directory or an rsync remote (`host:/path`).
pub fn publish_invocation(layout: &BuildLayout, target: &str) -> Invocation {
    Invocation::new("rsync")
        .arg("-av")
        .arg(with_trailing_slash(&layout.site_dir()))
        .arg(target)
}

pub async fn publish_site<R>(
    layout: &BuildLayout,
    target: &str,
    runner: &R,
) -> Result<(), SiteBuildError>
where
    R: CommandRunner + ?Sized,
{
    info!(publish_target = target, site = %layout.site_dir().display(), "[PUBLISH] Publishing site");
    run_strict(runner, &publish_invocation(layout, target))
        .await
        .map_err(SiteBuildError::command(Stage::Publish))?;
    info!(publish_target = target, "[PUBLISH] Site published");
    Ok(())
}
