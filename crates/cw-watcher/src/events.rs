//! Event types for file change notifications.
//!
//! This module provides the [`FileEvent`] delivered to subscription callbacks
//! and the mapping from raw `notify` events to it.
//!
//! # Event Flow
//!
//! ```text
//! File System Change
//!        │
//!        ▼
//! notify::Event (kind + paths)
//!        │  classify()
//!        ▼
//! FileEvent per path (Created / Modified / Removed)
//!        │  WatchSpec::accepts()
//!        ▼
//! subscription callback
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use camino::Utf8PathBuf;
use notify::event::{EventKind, ModifyKind, RenameMode};
use smallvec::SmallVec;

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    /// The file appeared (created, or renamed into place).
    Created,
    /// The file's contents changed.
    Modified,
    /// The file disappeared (deleted, or renamed away).
    Removed,
}

impl FileEventKind {
    /// Returns `true` for events that leave a file with new contents.
    ///
    /// # Examples
    ///
    /// ```
    /// use cw_watcher::FileEventKind;
    ///
    /// assert!(FileEventKind::Created.is_write());
    /// assert!(FileEventKind::Modified.is_write());
    /// assert!(!FileEventKind::Removed.is_write());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }

    /// Resolves an ambiguous notification by checking the filesystem.
    fn from_existence(path: &Path, present: Self) -> Self {
        if path.exists() { present } else { Self::Removed }
    }
}

/// A file change event with a UTF-8 path guarantee.
///
/// # Examples
///
/// ```
/// use cw_watcher::{FileEvent, FileEventKind};
/// use camino::Utf8PathBuf;
///
/// let event = FileEvent::new(
///     Utf8PathBuf::from("/proj/config/settings.json"),
///     FileEventKind::Created,
/// );
/// assert_eq!(event.file_name(), Some("settings.json"));
/// assert_eq!(event.extension(), Some("json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// The path of the file that changed.
    pub path: Utf8PathBuf,

    /// What happened to the file.
    pub kind: FileEventKind,

    /// The timestamp when this event was received.
    ///
    /// Uses [`Instant`] for monotonic timing, suitable for measuring
    /// elapsed time but not for wall-clock display.
    pub timestamp: Instant,
}

impl FileEvent {
    /// Creates a new file event for the given path.
    ///
    /// The timestamp is set to the current instant.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Instant::now(),
        }
    }

    /// Shorthand for a [`FileEventKind::Created`] event.
    #[inline]
    #[must_use]
    pub fn created(path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(path, FileEventKind::Created)
    }

    /// Shorthand for a [`FileEventKind::Modified`] event.
    #[inline]
    #[must_use]
    pub fn modified(path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(path, FileEventKind::Modified)
    }

    /// Shorthand for a [`FileEventKind::Removed`] event.
    #[inline]
    #[must_use]
    pub fn removed(path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(path, FileEventKind::Removed)
    }

    /// Returns the file extension, if any.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension()
    }

    /// Returns the file name without the directory path.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }
}

/// Splits a raw `notify` event into per-path changes.
///
/// Access and metadata-only notifications produce nothing. A rename that
/// reports both ends yields a removal of the old path and a creation of the
/// new one. Kinds that do not say what happened are resolved by checking
/// whether the path still exists.
pub(crate) fn classify(event: &notify::Event) -> SmallVec<[(PathBuf, FileEventKind); 2]> {
    let mut changes = SmallVec::new();

    let uniform = match event.kind {
        EventKind::Access(_) | EventKind::Modify(ModifyKind::Metadata(_)) => return changes,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            Some(FileEventKind::Created)
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            Some(FileEventKind::Removed)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.iter();
            if let Some(from) = paths.next() {
                changes.push((from.clone(), FileEventKind::Removed));
            }
            if let Some(to) = paths.next() {
                changes.push((to.clone(), FileEventKind::Created));
            }
            return changes;
        }
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
            for path in &event.paths {
                let kind = FileEventKind::from_existence(path, FileEventKind::Modified);
                changes.push((path.clone(), kind));
            }
            return changes;
        }
    };

    for path in &event.paths {
        let kind = uniform
            .unwrap_or_else(|| FileEventKind::from_existence(path, FileEventKind::Created));
        changes.push((path.clone(), kind));
    }

    changes
}
