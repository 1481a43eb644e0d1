//! Documentation build: `make html` in each source's `docsrc` directory.
//!
//! A zero exit from make is taken to mean `docsrc/build/html` now holds the
//! built site; the output is not inspected.

use std::path::PathBuf;

use tracing::{error, info};

use crate::command::{run_strict, Invocation};
use crate::config::SiteConfig;
use crate::contract::CommandRunner;
use crate::error::{SiteBuildError, Stage};
use crate::layout::BuildLayout;

/// Make target that produces the html tree.
pub const BUILD_TARGET: &str = "html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltSource {
    pub name: String,
    pub html_dir: PathBuf,
}

pub fn build_invocation(docsrc_dir: &std::path::Path) -> Invocation {
    Invocation::new("make")
        .arg("-C")
        .arg(docsrc_dir)
        .arg(BUILD_TARGET)
}

/// Build every configured source in name order. Stops at the first failure.
pub async fn build_sources<R>(
    config: &SiteConfig,
    layout: &BuildLayout,
    runner: &R,
) -> Result<Vec<BuiltSource>, SiteBuildError>
where
    R: CommandRunner + ?Sized,
{
    let mut built = Vec::new();
    for source in config.sources() {
        let docsrc = layout.docsrc_dir(&source.name);
        info!(source = %source.name, path = %docsrc.display(), "[BUILD] Building documentation");

        if let Err(e) = run_strict(runner, &build_invocation(&docsrc)).await {
            error!(source = %source.name, error = %e, "[BUILD][ERROR] Documentation build failed");
            return Err(SiteBuildError::command(Stage::Build)(e));
        }

        built.push(BuiltSource {
            name: source.name.clone(),
            html_dir: layout.html_dir(&source.name),
        });
    }
    info!(count = built.len(), "[BUILD] All sources built");
    Ok(built)
}
