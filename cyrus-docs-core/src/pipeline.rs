//! High-level pipeline: sync → build → assemble → (publish) for the whole site.
//!
//! This module ties the stages together for one run:
//!   - Syncs every source's checkout to its remote branch ([`repository`])
//!   - Builds each source's documentation ([`docbuild`])
//!   - Copies built html into the site tree at every web path ([`assemble`])
//!   - Pushes the site to its host when a publish target is configured ([`publish`])
//!
//! # Major Types
//! - [`SiteBuildConfig`]: everything a run needs, built once at startup
//! - [`SiteBuildReport`]: what each stage did, for the operator
//!
//! # Responsibilities
//! - Strictly sequential: a stage starts only when the previous one finished
//!   for every source
//! - Fail-fast: the first failing command ends the run with a
//!   [`SiteBuildError`] naming the stage
//! - No rollback: checkouts, builds and copies already done stay on disk and
//!   are reused by the next run
//!
//! # Error Handling
//! Callers receive the typed error; logging of each failure already happened
//! inside the stage that failed.
//!
//! [`repository`]: crate::repository
//! [`docbuild`]: crate::docbuild
//! [`assemble`]: crate::assemble
//! [`publish`]: crate::publish

use std::path::PathBuf;

use tracing::{error, info};

use crate::assemble::assemble_site;
use crate::config::SiteConfig;
use crate::contract::CommandRunner;
use crate::docbuild::build_sources;
use crate::error::SiteBuildError;
use crate::layout::BuildLayout;
use crate::publish::publish_site;
use crate::repository::{sync_sources, SyncAction};

/// The top-level site build configuration.
#[derive(Debug, Clone)]
pub struct SiteBuildConfig {
    pub site: SiteConfig,
    pub layout: BuildLayout,
    /// rsync destination for the finished site; `None` skips publishing.
    pub publish_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteBuildReport {
    pub sources: Vec<SourceReport>,
    pub webpaths: Vec<WebPathReport>,
    pub published_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub action: SyncAction,
    pub checkout_dir: PathBuf,
    pub html_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPathReport {
    pub path: String,
    pub source: String,
    pub destination: PathBuf,
}

pub async fn build_site<R>(
    config: &SiteBuildConfig,
    runner: &R,
) -> Result<SiteBuildReport, SiteBuildError>
where
    R: CommandRunner + ?Sized,
{
    info!(
        base_dir = %config.layout.base_dir().display(),
        "[SITE] Starting site build pipeline"
    );

    let result = run_stages(config, runner).await;
    match &result {
        Ok(report) => info!(
            sources = report.sources.len(),
            webpaths = report.webpaths.len(),
            published = report.published_to.is_some(),
            "[SITE] Site build complete"
        ),
        Err(e) => error!(stage = ?e.stage(), error = %e, "[SITE][ERROR] Site build aborted"),
    }
    result
}

async fn run_stages<R>(
    config: &SiteBuildConfig,
    runner: &R,
) -> Result<SiteBuildReport, SiteBuildError>
where
    R: CommandRunner + ?Sized,
{
    let synced = sync_sources(&config.site, &config.layout, runner).await?;
    let built = build_sources(&config.site, &config.layout, runner).await?;
    let assembled = assemble_site(&config.site, &config.layout, runner).await?;

    if let Some(target) = &config.publish_to {
        publish_site(&config.layout, target, runner).await?;
    } else {
        info!("[PUBLISH] No publish target configured, skipping");
    }

    let sources = synced
        .into_iter()
        .zip(built)
        .map(|(s, b)| SourceReport {
            name: s.name,
            action: s.action,
            checkout_dir: s.checkout_dir,
            html_dir: b.html_dir,
        })
        .collect();

    let webpaths = assembled
        .into_iter()
        .map(|a| WebPathReport {
            path: a.path,
            source: a.source,
            destination: a.destination,
        })
        .collect();

    Ok(SiteBuildReport {
        sources,
        webpaths,
        published_to: config.publish_to.clone(),
    })
}
