///
/// This module implements the CLI interface for cyrus-docs: flag parsing, configuration loading and
/// the user-visible run of the site build.
///
/// All pipeline logic (source tables, command execution, sync/build/assemble) lives in the [`cyrus-docs-core`] crate.
/// This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: run `cyrus-docs`, or `cyrus-docs --only-dev` for just the development docs.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`cyrus-docs-core`]: ../../cyrus-docs-core/
use crate::load_config::load_config;
use anyhow::Result;
use clap::Parser;
use cyrus_docs_core::command::SystemRunner;
use cyrus_docs_core::config::Mode;
use cyrus_docs_core::pipeline::build_site;

/// CLI for cyrus-docs: build and assemble the Cyrus IMAP documentation site.
#[derive(Parser, Debug)]
#[clap(
    name = "cyrus-docs",
    about = "Sync the Cyrus IMAP documentation sources, build them, and assemble the website"
)]
pub struct Cli {
    /// Only build the development (master) documentation, placed at the site root
    #[clap(long)]
    pub only_dev: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.only_dev {
            Mode::DevOnly
        } else {
            Mode::Full
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = load_config(cli.mode())?;
    tracing::info!(command = "build", mode = ?cli.mode(), "Starting site build");
    println!("Site build starting...");

    match build_site(&config, &SystemRunner).await {
        Ok(report) => {
            tracing::info!(command = "build", "Site build complete");
            println!("Site build complete.\nReport:");
            println!("{:#?}", report);
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "build", error = %e, "Site build failed");
            eprintln!("[ERROR] Site build failed: {}", e);
            Err(anyhow::Error::new(e).context("Site build failed"))
        }
    }
}
