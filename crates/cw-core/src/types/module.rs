//! Module root identity.
//!
//! A module is a directory containing a manifest file. Its root path is the
//! key under which the registry stores the module's watch subscription.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// The root directory of a discovered module.
///
/// Two roots are the same module if and only if their paths are equal, so
/// callers are expected to build roots from canonical paths.
///
/// # Examples
///
/// ```
/// use cw_core::{LayoutConfig, ModuleRoot};
/// use camino::Utf8Path;
///
/// let root = ModuleRoot::from_manifest(Utf8Path::new("/proj/go.mod")).unwrap();
/// assert_eq!(root.as_path(), "/proj");
/// assert_eq!(root.config_dir(&LayoutConfig::default()), "/proj/config");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleRoot(Utf8PathBuf);

impl ModuleRoot {
    /// Creates a module root from a directory path.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the module root owning the given manifest file.
    ///
    /// Returns `None` if the manifest path has no parent directory.
    #[must_use]
    pub fn from_manifest(manifest: &Utf8Path) -> Option<Self> {
        manifest
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map(|parent| Self(parent.to_owned()))
    }

    /// Returns the module's configuration directory.
    #[must_use]
    pub fn config_dir(&self, layout: &LayoutConfig) -> Utf8PathBuf {
        self.0.join(&layout.config_dir)
    }

    /// Returns the root directory path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }
}

impl AsRef<Utf8Path> for ModuleRoot {
    fn as_ref(&self) -> &Utf8Path {
        &self.0
    }
}

impl fmt::Display for ModuleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
