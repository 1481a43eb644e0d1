/// `load_config` module: Builds the run configuration from the built-in site table, an optional YAML file and environment overrides.
///
/// This is the only place where user-supplied configuration is parsed and mapped to the typed tables of `cyrus-docs-core`.
///
/// # Sources, in order of precedence
/// 1. Environment: `CYRUS_DOCS_BASEDIR`, `CYRUS_DOCS_PUBLISH_TO`
/// 2. The YAML file named by `CYRUS_DOCS_CONFIG`, if set
/// 3. Built-in defaults: [`SiteConfig::builtin`] and `$HOME/cyrus-docs-build`
///
/// When a YAML file is given, its `sources`/`webpaths` replace the built-in table entirely.
///
/// ```yaml
/// base_dir: /srv/cyrus-docs
/// publish_to: www.example.org:/var/www/cyrus
/// dev_source: cyrus-imapd-master
/// sources:
///   cyrus-imapd-master:
///     repo: https://github.com/cyrusimap/cyrus-imapd.git
///     branch: master
///   cyrus-imapd-3.10:
///     repo: https://github.com/cyrusimap/cyrus-imapd.git
/// webpaths:
///   /: cyrus-imapd-3.10
///   /dev: cyrus-imapd-master
/// ```
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use cyrus_docs_core::config::{Mode, SiteConfig, Source, WebPath, DEFAULT_DEV_SOURCE};
use cyrus_docs_core::layout::BuildLayout;
use cyrus_docs_core::pipeline::SiteBuildConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const CONFIG_ENV: &str = "CYRUS_DOCS_CONFIG";
pub const BASEDIR_ENV: &str = "CYRUS_DOCS_BASEDIR";
pub const PUBLISH_ENV: &str = "CYRUS_DOCS_PUBLISH_TO";

/// Directory name used under `$HOME` when no base directory is configured.
pub const DEFAULT_BASEDIR_NAME: &str = "cyrus-docs-build";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default)]
    pub publish_to: Option<String>,
    #[serde(default)]
    pub dev_source: Option<String>,
    pub sources: BTreeMap<String, SourceSection>,
    #[serde(default)]
    pub webpaths: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSection {
    pub repo: String,
    #[serde(default)]
    pub branch: Option<String>,
}

impl FileConfig {
    /// Map the YAML tables onto a validated [`SiteConfig`].
    ///
    /// Without an explicit `dev_source`, `cyrus-imapd-master` is used when
    /// present, otherwise the first source by name.
    pub fn to_site_config(&self) -> Result<SiteConfig, cyrus_docs_core::config::ConfigError> {
        let dev_source = match &self.dev_source {
            Some(name) => name.clone(),
            None if self.sources.contains_key(DEFAULT_DEV_SOURCE) => DEFAULT_DEV_SOURCE.to_string(),
            None => self.sources.keys().next().cloned().unwrap_or_default(),
        };

        let sources = self.sources.iter().map(|(name, s)| Source {
            name: name.clone(),
            repo: s.repo.clone(),
            branch: s.branch.clone(),
        });
        let webpaths = self
            .webpaths
            .iter()
            .map(|(path, source)| WebPath::new(path.clone(), source.clone()));

        SiteConfig::new(sources, webpaths, dev_source)
    }
}

/// Reads and parses a YAML site configuration file.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?} (from {}): {}",
                path_ref,
                CONFIG_ENV,
                e
            ));
        }
    };

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML {:?}: {e}", path_ref))
        }
    }
}

/// `$HOME/cyrus-docs-build`, or `./cyrus-docs-build` without a home directory.
pub fn default_base_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_BASEDIR_NAME),
        _ => PathBuf::from(DEFAULT_BASEDIR_NAME),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Assemble the configuration for one run in the given mode.
pub fn load_config(mode: Mode) -> Result<SiteBuildConfig> {
    let file = match env::var_os(CONFIG_ENV) {
        Some(path) => Some((PathBuf::from(&path), load_config_file(&path)?)),
        None => {
            info!("{CONFIG_ENV} not set, using built-in site table");
            None
        }
    };

    let site = match &file {
        Some((path, f)) => f
            .to_site_config()
            .with_context(|| format!("Invalid site configuration in {}", path.display()))?,
        None => SiteConfig::builtin(),
    };

    let base_dir = non_empty_env(BASEDIR_ENV)
        .map(PathBuf::from)
        .or_else(|| file.as_ref().and_then(|(_, f)| f.base_dir.clone()))
        .unwrap_or_else(default_base_dir);

    let publish_to = non_empty_env(PUBLISH_ENV)
        .or_else(|| file.as_ref().and_then(|(_, f)| f.publish_to.clone()));

    info!(
        base_dir = %base_dir.display(),
        publish_to = publish_to.as_deref().unwrap_or("<none>"),
        ?mode,
        "Config loaded and merged successfully"
    );

    Ok(SiteBuildConfig {
        site: site.resolve(mode),
        layout: BuildLayout::new(base_dir),
        publish_to,
    })
}
