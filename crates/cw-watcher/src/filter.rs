//! File filtering for watch events.
//!
//! A [`FileFilter`] decides, per path, whether a subscription callback sees
//! an event. Filtering at the source keeps unrelated traffic (editor swap
//! files, generated output, dependency caches) away from the event loop.
//!
//! # Examples
//!
//! ```
//! use cw_watcher::{CompositeFilter, ExtensionFilter, FileFilter, SkipDirsFilter};
//! use camino::Utf8Path;
//!
//! let filter = CompositeFilter::new()
//!     .and(ExtensionFilter::new(&["json"]))
//!     .and(SkipDirsFilter::new("/work", ["node_modules"]));
//!
//! assert!(filter.should_process(Utf8Path::new("/work/svc/config/app.json")));
//! assert!(!filter.should_process(Utf8Path::new("/work/node_modules/x/config/app.json")));
//! assert!(!filter.should_process(Utf8Path::new("/work/svc/config/app.yaml")));
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use smallvec::SmallVec;

/// A filter for determining which file events to process.
///
/// # Thread Safety
///
/// Filters must be [`Send`] and [`Sync`] because the notify backend calls
/// them from its own event thread.
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if the file at the given path should be processed.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// A filter that accepts all files.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilter;

impl FileFilter for AcceptAllFilter {
    #[inline]
    fn should_process(&self, _path: &Utf8Path) -> bool {
        true
    }
}

/// A filter based on file extensions.
///
/// Extensions are compared exactly (case-sensitive), without the leading dot.
///
/// # Examples
///
/// ```
/// use cw_watcher::{FileFilter, ExtensionFilter};
/// use camino::Utf8Path;
///
/// let filter = ExtensionFilter::new(&["json"]);
/// assert!(filter.should_process(Utf8Path::new("config/app.json")));
/// assert!(filter.should_process(Utf8Path::new("config/app.v2.json")));
/// assert!(!filter.should_process(Utf8Path::new("config/app.json.swp")));
/// ```
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: SmallVec<[String; 4]>,
}

impl ExtensionFilter {
    /// Creates a new extension filter.
    #[must_use]
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Creates an extension filter accepting a single owned extension.
    #[must_use]
    pub fn single(extension: impl Into<String>) -> Self {
        let mut extensions = SmallVec::new();
        extensions.push(extension.into());
        Self { extensions }
    }
}

impl FileFilter for ExtensionFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// A filter accepting files with one exact name, such as `go.mod`.
///
/// # Examples
///
/// ```
/// use cw_watcher::{FileFilter, FileNameFilter};
/// use camino::Utf8Path;
///
/// let filter = FileNameFilter::new("go.mod");
/// assert!(filter.should_process(Utf8Path::new("/work/svc/go.mod")));
/// assert!(!filter.should_process(Utf8Path::new("/work/svc/go.sum")));
/// ```
#[derive(Debug, Clone)]
pub struct FileNameFilter {
    name: String,
}

impl FileNameFilter {
    /// Creates a new file name filter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl FileFilter for FileNameFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        path.file_name() == Some(self.name.as_str())
    }
}

/// A filter rejecting paths that pass through an ignored directory.
///
/// Only the components below `base` are inspected, so a workspace that
/// itself lives under a directory named like an ignored one still works.
#[derive(Debug, Clone)]
pub struct SkipDirsFilter {
    base: Utf8PathBuf,
    skip_dirs: SmallVec<[String; 4]>,
}

impl SkipDirsFilter {
    /// Creates a new filter rooted at `base`.
    #[must_use]
    pub fn new<I, S>(base: impl Into<Utf8PathBuf>, skip_dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base: base.into(),
            skip_dirs: skip_dirs.into_iter().map(Into::into).collect(),
        }
    }
}

impl FileFilter for SkipDirsFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        let relative = path.strip_prefix(&self.base).unwrap_or(path);
        let Some(parent) = relative.parent() else {
            return true;
        };

        !parent
            .components()
            .any(|component| self.skip_dirs.iter().any(|d| d == component.as_str()))
    }
}

/// A composite filter that combines multiple filters with AND logic.
///
/// All filters must return `true` for the file to be processed. An empty
/// composite accepts everything.
pub struct CompositeFilter {
    filters: Vec<Box<dyn FileFilter>>,
}

impl CompositeFilter {
    /// Creates a new empty composite filter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Adds a filter to the composite.
    #[must_use]
    pub fn and<F: FileFilter>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Default for CompositeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompositeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeFilter")
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl FileFilter for CompositeFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        self.filters.iter().all(|f| f.should_process(path))
    }
}

impl<F: FileFilter + ?Sized> FileFilter for Box<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}

impl<F: FileFilter + ?Sized> FileFilter for std::sync::Arc<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}
