//! Change notifications scoped to a module.

use camino::{Utf8Path, Utf8PathBuf};

use super::module::ModuleRoot;

/// A configuration file was created or modified inside a watched module.
///
/// Produced by a module's watch subscription and consumed once by the
/// dispatcher. It carries everything needed to handle the change, so two
/// events never share state.
///
/// # Examples
///
/// ```
/// use cw_core::{ChangeEvent, ModuleRoot};
/// use camino::Utf8PathBuf;
///
/// let event = ChangeEvent::new(
///     ModuleRoot::new("/proj"),
///     Utf8PathBuf::from("/proj/config/settings.json"),
/// );
/// assert_eq!(event.file_name(), Some("settings.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The module the changed file belongs to.
    pub root: ModuleRoot,

    /// The path reported by the watcher.
    pub path: Utf8PathBuf,
}

impl ChangeEvent {
    /// Creates a new change event.
    #[inline]
    #[must_use]
    pub fn new(root: ModuleRoot, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root,
            path: path.into(),
        }
    }

    /// Returns the changed file's name without its directory.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Returns the changed path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}
