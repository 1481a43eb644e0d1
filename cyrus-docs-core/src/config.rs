//! Site tables: which repositories are documentation sources, and where each
//! one's built html lands in the assembled site.
//!
//! A [`SiteConfig`] is an immutable value. It is validated once when it is
//! constructed and then handed to the pipeline; nothing here is process-wide
//! state. Both tables are `BTreeMap`s, so iteration (and therefore the order in
//! which sources are synced/built and web paths are assembled) is
//! lexicographic by key on every run.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::layout::SITE_DIR_NAME;

/// Upstream repository all built-in sources are cloned from.
pub const CYRUS_IMAPD_REPO: &str = "https://github.com/cyrusimap/cyrus-imapd.git";

/// Source used for `--only-dev` runs unless the configuration names another.
pub const DEFAULT_DEV_SOURCE: &str = "cyrus-imapd-master";

/// A documentation project tracked via its git remote and branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub repo: String,
    /// Branch to track. `None` means "same as the source name".
    pub branch: Option<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repo: repo.into(),
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// The effective branch: the configured one, or the source name.
    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(&self.name)
    }

    /// The name becomes a directory directly under the base directory, so it
    /// must be a single plain path component other than the site directory.
    fn check(&self) -> Result<(), ConfigError> {
        let reason = match self.name.as_str() {
            "" => "must not be empty",
            "." | ".." => "must not be '.' or '..'",
            SITE_DIR_NAME => "collides with the assembled site directory",
            name if name.contains('/') || name.contains('\\') => {
                "must not contain path separators"
            }
            _ => return Ok(()),
        };
        Err(ConfigError::InvalidSourceName {
            name: self.name.clone(),
            reason,
        })
    }
}

/// A path in the assembled site, served from exactly one source's html.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPath {
    pub path: String,
    pub source: String,
}

impl WebPath {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Location below the site root, without leading or trailing slash.
    /// Empty for the site root itself.
    pub fn relative(&self) -> &str {
        self.path
            .strip_prefix('/')
            .unwrap_or(&self.path)
            .trim_end_matches('/')
    }

    fn check(&self) -> Result<(), ConfigError> {
        if !self.path.starts_with('/') {
            return Err(ConfigError::InvalidWebPath {
                path: self.path.clone(),
                reason: "must start with '/'",
            });
        }
        let relative = self.relative();
        if relative.is_empty() {
            return Ok(());
        }
        for segment in relative.split('/') {
            match segment {
                "" => {
                    return Err(ConfigError::InvalidWebPath {
                        path: self.path.clone(),
                        reason: "contains an empty segment",
                    })
                }
                "." | ".." => {
                    return Err(ConfigError::InvalidWebPath {
                        path: self.path.clone(),
                        reason: "must not contain '.' or '..' segments",
                    })
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Which part of the site a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Every configured source and web path.
    #[default]
    Full,
    /// Only the development source, published at the site root.
    DevOnly,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no documentation sources configured")]
    NoSources,

    #[error("source '{0}' is configured more than once")]
    DuplicateSource(String),

    #[error("invalid source name '{name}': {reason}")]
    InvalidSourceName { name: String, reason: &'static str },

    #[error("web path '{0}' is configured more than once")]
    DuplicateWebPath(String),

    #[error("invalid web path '{path}': {reason}")]
    InvalidWebPath { path: String, reason: &'static str },

    #[error("web path '{webpath}' refers to unknown source '{source_name}'")]
    UnknownSource { webpath: String, source_name: String },

    #[error("development source '{0}' is not a configured source")]
    UnknownDevSource(String),
}

/// Validated source and web path tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    sources: BTreeMap<String, Source>,
    webpaths: BTreeMap<String, WebPath>,
    dev_source: String,
}

impl SiteConfig {
    /// Build and validate a configuration. Duplicate names, malformed web
    /// paths and dangling source references are rejected here rather than
    /// half way through a run.
    pub fn new(
        sources: impl IntoIterator<Item = Source>,
        webpaths: impl IntoIterator<Item = WebPath>,
        dev_source: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let mut source_map = BTreeMap::new();
        for source in sources {
            if source_map.contains_key(&source.name) {
                return Err(ConfigError::DuplicateSource(source.name));
            }
            source_map.insert(source.name.clone(), source);
        }

        // `/stable` and `/stable/` land in the same directory.
        let mut destinations = BTreeSet::new();
        let mut webpath_map = BTreeMap::new();
        for webpath in webpaths {
            if !destinations.insert(webpath.relative().to_string()) {
                return Err(ConfigError::DuplicateWebPath(webpath.path));
            }
            webpath_map.insert(webpath.path.clone(), webpath);
        }

        let config = Self {
            sources: source_map,
            webpaths: webpath_map,
            dev_source: dev_source.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// The Cyrus IMAP documentation site as published upstream.
    pub fn builtin() -> Self {
        let sources = [
            Source::new("cyrus-imapd-master", CYRUS_IMAPD_REPO).with_branch("master"),
            Source::new("cyrus-imapd-3.10", CYRUS_IMAPD_REPO),
            Source::new("cyrus-imapd-3.8", CYRUS_IMAPD_REPO),
            Source::new("cyrus-imapd-3.6", CYRUS_IMAPD_REPO),
            Source::new("cyrus-imapd-3.4", CYRUS_IMAPD_REPO),
        ];
        let webpaths = [
            WebPath::new("/", "cyrus-imapd-3.10"),
            WebPath::new("/stable", "cyrus-imapd-3.10"),
            WebPath::new("/dev", "cyrus-imapd-master"),
            WebPath::new("/3.10", "cyrus-imapd-3.10"),
            WebPath::new("/3.8", "cyrus-imapd-3.8"),
            WebPath::new("/3.6", "cyrus-imapd-3.6"),
            WebPath::new("/3.4", "cyrus-imapd-3.4"),
        ];
        Self {
            sources: sources
                .into_iter()
                .map(|s| (s.name.clone(), s))
                .collect(),
            webpaths: webpaths
                .into_iter()
                .map(|w| (w.path.clone(), w))
                .collect(),
            dev_source: DEFAULT_DEV_SOURCE.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for source in self.sources.values() {
            source.check()?;
        }
        for webpath in self.webpaths.values() {
            webpath.check()?;
            if !self.sources.contains_key(&webpath.source) {
                return Err(ConfigError::UnknownSource {
                    webpath: webpath.path.clone(),
                    source_name: webpath.source.clone(),
                });
            }
        }
        if !self.sources.contains_key(&self.dev_source) {
            return Err(ConfigError::UnknownDevSource(self.dev_source.clone()));
        }
        Ok(())
    }

    /// Effective tables for a run. Dev-only collapses everything to the
    /// development source served from `/`.
    pub fn resolve(&self, mode: Mode) -> SiteConfig {
        let resolved = match mode {
            Mode::Full => self.clone(),
            Mode::DevOnly => {
                let mut sources = BTreeMap::new();
                if let Some(dev) = self.sources.get(&self.dev_source) {
                    sources.insert(dev.name.clone(), dev.clone());
                }
                let mut webpaths = BTreeMap::new();
                webpaths.insert("/".to_string(), WebPath::new("/", self.dev_source.clone()));
                SiteConfig {
                    sources,
                    webpaths,
                    dev_source: self.dev_source.clone(),
                }
            }
        };
        resolved.trace_loaded(mode);
        resolved
    }

    /// Sources in name order.
    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    /// Web paths in path order.
    pub fn webpaths(&self) -> impl Iterator<Item = &WebPath> {
        self.webpaths.values()
    }

    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.get(name)
    }

    pub fn dev_source(&self) -> &str {
        &self.dev_source
    }

    pub fn trace_loaded(&self, mode: Mode) {
        info!(
            ?mode,
            sources_count = self.sources.len(),
            webpaths_count = self.webpaths.len(),
            "Resolved site configuration"
        );
        debug!(?self, "Site configuration (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_defaults_to_source_name() {
        let source = Source::new("cyrus-imapd-3.8", CYRUS_IMAPD_REPO);
        assert_eq!(source.branch(), "cyrus-imapd-3.8");

        let source = source.with_branch("main");
        assert_eq!(source.branch(), "main");
    }

    #[test]
    fn builtin_table_is_valid() {
        let config = SiteConfig::builtin();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.sources().count(), 5);
        assert_eq!(config.webpaths().count(), 7);
    }

    #[test]
    fn builtin_root_and_stable_fan_out_to_the_same_source() {
        let config = SiteConfig::builtin();
        let target = |path: &str| {
            config
                .webpaths()
                .find(|w| w.path == path)
                .map(|w| w.source.clone())
        };
        assert_eq!(target("/"), Some("cyrus-imapd-3.10".to_string()));
        assert_eq!(target("/stable"), target("/"));
    }

    #[test]
    fn iteration_is_lexicographic() {
        let config = SiteConfig::new(
            [
                Source::new("zeta", "z.git"),
                Source::new("alpha", "a.git"),
                Source::new("mid", "m.git"),
            ],
            [
                WebPath::new("/z", "zeta"),
                WebPath::new("/", "mid"),
                WebPath::new("/a", "alpha"),
            ],
            "mid",
        )
        .unwrap();

        let names: Vec<_> = config.sources().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
        let paths: Vec<_> = config.webpaths().map(|w| w.path.as_str()).collect();
        assert_eq!(paths, ["/", "/a", "/z"]);
    }

    #[test]
    fn dev_only_yields_one_source_at_site_root() {
        let resolved = SiteConfig::builtin().resolve(Mode::DevOnly);

        let sources: Vec<_> = resolved.sources().collect();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, DEFAULT_DEV_SOURCE);
        assert_eq!(sources[0].branch(), "master");

        let webpaths: Vec<_> = resolved.webpaths().collect();
        assert_eq!(webpaths, [&WebPath::new("/", DEFAULT_DEV_SOURCE)]);
    }

    #[test]
    fn full_mode_is_unchanged() {
        let config = SiteConfig::builtin();
        assert_eq!(config.resolve(Mode::Full), config);
    }

    #[test]
    fn rejects_dangling_source_reference() {
        let err = SiteConfig::new(
            [Source::new("A", "R")],
            [WebPath::new("/x", "B")],
            "A",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownSource {
                webpath: "/x".into(),
                source_name: "B".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_web_paths() {
        for path in ["x", "/a//b", "/../etc", "/a/./b"] {
            let result = SiteConfig::new([Source::new("A", "R")], [WebPath::new(path, "A")], "A");
            assert!(
                matches!(result, Err(ConfigError::InvalidWebPath { .. })),
                "{path} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn rejects_duplicates_and_empty_tables() {
        assert_eq!(
            SiteConfig::new(Vec::<Source>::new(), Vec::<WebPath>::new(), "A").unwrap_err(),
            ConfigError::NoSources
        );
        assert_eq!(
            SiteConfig::new([Source::new("A", "R"), Source::new("A", "S")], [], "A").unwrap_err(),
            ConfigError::DuplicateSource("A".into())
        );
        assert_eq!(
            SiteConfig::new([Source::new("A", "R")], [], "B").unwrap_err(),
            ConfigError::UnknownDevSource("B".into())
        );
    }

    #[test]
    fn rejects_source_names_that_escape_the_base_directory() {
        for name in ["", ".", "..", "/tmp/elsewhere", "a/b", SITE_DIR_NAME] {
            let result = SiteConfig::new([Source::new(name, "R")], [WebPath::new("/", name)], name);
            assert!(
                matches!(result, Err(ConfigError::InvalidSourceName { .. })),
                "{name:?} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn accepted_source_names_stay_under_the_base_directory() {
        let layout = crate::layout::BuildLayout::new("/srv/base");
        for source in SiteConfig::builtin().sources() {
            let dir = layout.checkout_dir(&source.name);
            assert_eq!(dir.parent(), Some(layout.base_dir()));
            assert_ne!(dir, layout.site_dir());
        }
    }

    #[test]
    fn web_paths_with_the_same_destination_are_duplicates() {
        for (first, second) in [("/stable", "/stable/"), ("/", "//")] {
            let err = SiteConfig::new(
                [Source::new("A", "R")],
                [WebPath::new(first, "A"), WebPath::new(second, "A")],
                "A",
            )
            .unwrap_err();
            assert_eq!(err, ConfigError::DuplicateWebPath(second.to_string()));
        }
    }

    #[test]
    fn relative_strips_slashes() {
        assert_eq!(WebPath::new("/", "A").relative(), "");
        assert_eq!(WebPath::new("/stable/", "A").relative(), "stable");
        assert_eq!(WebPath::new("/docs/3.8", "A").relative(), "docs/3.8");
    }
}
