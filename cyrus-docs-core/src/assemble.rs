//! Site assembly: copy each web path's built html into the site tree.
//!
//! Copies are `rsync -av src/ dest/`, so the *contents* of the html tree land
//! at the web path. Nothing is deleted from the destination. Several web paths
//! may point at the same source; each gets its own copy.

use std::path::PathBuf;

use tracing::{error, info};

use crate::command::{run_strict, with_trailing_slash, Invocation};
use crate::config::{SiteConfig, WebPath};
use crate::contract::CommandRunner;
use crate::error::{SiteBuildError, Stage};
use crate::layout::BuildLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPath {
    pub path: String,
    pub source: String,
    pub destination: PathBuf,
}

pub fn copy_invocation(from: &std::path::Path, to: &std::path::Path) -> Invocation {
    Invocation::new("rsync")
        .arg("-av")
        .arg(with_trailing_slash(from))
        .arg(with_trailing_slash(to))
}

async fn assemble_webpath<R>(
    webpath: &WebPath,
    layout: &BuildLayout,
    runner: &R,
) -> Result<AssembledPath, SiteBuildError>
where
    R: CommandRunner + ?Sized,
{
    let html_dir = layout.html_dir(&webpath.source);
    let destination = layout.webpath_dir(webpath);

    BuildLayout::ensure_dir(&destination).map_err(SiteBuildError::io(&destination))?;

    info!(
        webpath = %webpath.path,
        source = %webpath.source,
        from = %html_dir.display(),
        to = %destination.display(),
        "[ASSEMBLE] Copying built html"
    );
    run_strict(runner, &copy_invocation(&html_dir, &destination))
        .await
        .map_err(SiteBuildError::command(Stage::Assemble))?;

    Ok(AssembledPath {
        path: webpath.path.clone(),
        source: webpath.source.clone(),
        destination,
    })
}

/// Copy every web path in path order. Stops at the first failure; web paths
/// already copied stay in place.
pub async fn assemble_site<R>(
    config: &SiteConfig,
    layout: &BuildLayout,
    runner: &R,
) -> Result<Vec<AssembledPath>, SiteBuildError>
where
    R: CommandRunner + ?Sized,
{
    let site_dir = layout.site_dir();
    BuildLayout::ensure_dir(&site_dir).map_err(SiteBuildError::io(&site_dir))?;

    let mut assembled = Vec::new();
    for webpath in config.webpaths() {
        match assemble_webpath(webpath, layout, runner).await {
            Ok(a) => assembled.push(a),
            Err(e) => {
                error!(webpath = %webpath.path, error = %e, "[ASSEMBLE][ERROR] Copy failed");
                return Err(e);
            }
        }
    }
    info!(
        count = assembled.len(),
        site = %site_dir.display(),
        "[ASSEMBLE] Site assembled"
    );
    Ok(assembled)
}
