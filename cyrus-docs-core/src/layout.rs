//! On-disk layout of the build directory.
//!
//! ```text
//! <base>/
//!   <source>/                    git checkout, one per source
//!     docsrc/                    documentation subtree, built with `make html`
//!       build/html/              built output copied into the site
//!   cyrus-site/                  assembled site
//!     <webpath>/                 one per web path ("/" is cyrus-site itself)
//! ```
//!
//! The base directory is a cache: it is created when missing, mutated in
//! place and never deleted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::WebPath;

/// Name of the assembled site directory under the base directory.
pub const SITE_DIR_NAME: &str = "cyrus-site";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    base_dir: PathBuf,
}

impl BuildLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn checkout_dir(&self, source: &str) -> PathBuf {
        self.base_dir.join(source)
    }

    pub fn docsrc_dir(&self, source: &str) -> PathBuf {
        self.checkout_dir(source).join("docsrc")
    }

    pub fn html_dir(&self, source: &str) -> PathBuf {
        self.docsrc_dir(source).join("build").join("html")
    }

    pub fn site_dir(&self) -> PathBuf {
        self.base_dir.join(SITE_DIR_NAME)
    }

    pub fn webpath_dir(&self, webpath: &WebPath) -> PathBuf {
        let relative = webpath.relative();
        if relative.is_empty() {
            self.site_dir()
        } else {
            self.site_dir().join(relative)
        }
    }

    /// Create `path` and any missing parents.
    pub fn ensure_dir(path: &Path) -> io::Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
            debug!(path = %path.display(), "Created directory");
        }
        Ok(())
    }
}
