//! Watch subscriptions backed by `notify`.
//!
//! This module defines the [`WatchCapability`] seam the rest of the workspace
//! programs against, and [`NotifyWatch`], the implementation used in
//! production.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                   notify event thread                            │
//! │  ┌────────────────────┐   ┌──────────────┐   ┌────────────────┐  │
//! │  │ RecommendedWatcher │ → │ (Debouncer)  │ → │ classify +     │  │
//! │  │ one per spec       │   │ opt-in       │   │ WatchSpec      │  │
//! │  └────────────────────┘   └──────────────┘   └───────┬────────┘  │
//! └──────────────────────────────────────────────────────│───────────┘
//!                                                        │ EventCallback
//!                                                        ▼
//!                                    caller-owned channel / event loop
//! ```
//!
//! Each subscription owns its own watcher, so releasing one subscription
//! never disturbs another.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};

use cw_core::WatchConfig;

use crate::error::WatchError;
use crate::events::{FileEvent, FileEventKind, classify};
use crate::filter::{AcceptAllFilter, FileFilter};

/// Callback invoked for every accepted event of a subscription.
///
/// May be called from a thread owned by the backend.
pub type EventCallback = Arc<dyn Fn(FileEvent) + Send + Sync + 'static>;

/// Wraps a closure into an [`EventCallback`].
///
/// # Examples
///
/// ```
/// use cw_watcher::{callback, FileEvent};
///
/// let on_event = callback(|event: FileEvent| {
///     println!("{} changed", event.path);
/// });
/// ```
pub fn callback<F>(f: F) -> EventCallback
where
    F: Fn(FileEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// What a subscription watches.
///
/// # Examples
///
/// ```
/// use cw_watcher::{ExtensionFilter, WatchSpec};
/// use camino::Utf8Path;
///
/// let spec = WatchSpec::new("/proj/config").with_filter(ExtensionFilter::new(&["json"]));
///
/// assert!(spec.accepts(Utf8Path::new("/proj/config/app.json")));
/// assert!(!spec.accepts(Utf8Path::new("/proj/config/nested/app.json")));
/// assert!(!spec.accepts(Utf8Path::new("/proj/config/app.yaml")));
/// ```
#[derive(Clone)]
pub struct WatchSpec {
    /// Directory to watch.
    pub directory: Utf8PathBuf,

    /// Whether events from subdirectories are delivered.
    pub recursive: bool,

    /// Filter applied to every event path.
    pub filter: Arc<dyn FileFilter>,
}

impl WatchSpec {
    /// Creates a non-recursive spec accepting every direct child of `directory`.
    #[must_use]
    pub fn new(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            recursive: false,
            filter: Arc::new(AcceptAllFilter),
        }
    }

    /// Sets whether subdirectories are watched.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Replaces the event filter.
    #[must_use]
    pub fn with_filter<F: FileFilter>(mut self, filter: F) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    /// Returns `true` if an event for `path` belongs to this spec.
    ///
    /// Non-recursive specs only accept direct children of the directory.
    #[must_use]
    pub fn accepts(&self, path: &Utf8Path) -> bool {
        let in_scope = if self.recursive {
            path != self.directory && path.starts_with(&self.directory)
        } else {
            path.parent() == Some(self.directory.as_path())
        };

        in_scope && self.filter.should_process(path)
    }

    fn mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }
}

impl std::fmt::Debug for WatchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSpec")
            .field("directory", &self.directory)
            .field("recursive", &self.recursive)
            .finish_non_exhaustive()
    }
}

/// The host's "notify me when files change" capability.
///
/// Subscriptions are exclusively owned by the caller. Once [`release`]
/// returns, the subscription's callback is never invoked again.
///
/// [`release`]: WatchCapability::release
pub trait WatchCapability: Send + Sync + 'static {
    /// Handle to an active subscription.
    type Subscription: Send + 'static;

    /// Starts delivering accepted events under `spec` to `on_event`.
    fn subscribe(
        &self,
        spec: WatchSpec,
        on_event: EventCallback,
    ) -> Result<Self::Subscription, WatchError>;

    /// Stops a subscription.
    fn release(&self, subscription: Self::Subscription);
}

impl<C: WatchCapability> WatchCapability for Arc<C> {
    type Subscription = C::Subscription;

    fn subscribe(
        &self,
        spec: WatchSpec,
        on_event: EventCallback,
    ) -> Result<Self::Subscription, WatchError> {
        (**self).subscribe(spec, on_event)
    }

    fn release(&self, subscription: Self::Subscription) {
        (**self).release(subscription);
    }
}

/// [`WatchCapability`] backed by the platform's native notification API.
///
/// # Examples
///
/// ```no_run
/// use cw_watcher::{callback, ExtensionFilter, NotifyWatch, WatchCapability, WatchSpec};
/// use cw_core::WatchConfig;
///
/// # fn example() -> Result<(), cw_watcher::WatchError> {
/// let watch = NotifyWatch::new(&WatchConfig::default());
/// let spec = WatchSpec::new("/proj/config").with_filter(ExtensionFilter::new(&["json"]));
///
/// let subscription = watch.subscribe(spec, callback(|event| {
///     println!("{:?} {}", event.kind, event.path);
/// }))?;
///
/// // ... later
/// watch.release(subscription);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NotifyWatch {
    debounce: Option<Duration>,
}

impl NotifyWatch {
    /// Creates a backend honoring the configured debounce window.
    #[must_use]
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            debounce: config
                .is_debounced()
                .then(|| Duration::from_millis(config.debounce_ms)),
        }
    }

    /// Returns the debounce window, if debouncing is enabled.
    #[must_use]
    pub const fn debounce(&self) -> Option<Duration> {
        self.debounce
    }
}

impl WatchCapability for NotifyWatch {
    type Subscription = NotifySubscription;

    fn subscribe(
        &self,
        spec: WatchSpec,
        on_event: EventCallback,
    ) -> Result<NotifySubscription, WatchError> {
        if !spec.directory.exists() {
            return Err(WatchError::path_not_found(spec.directory));
        }
        if !spec.directory.is_dir() {
            return Err(WatchError::not_a_directory(spec.directory));
        }

        // Backends report canonical paths, so the scope check must use one too
        let directory = spec.directory.canonicalize_utf8()?;
        let spec = WatchSpec { directory, ..spec };
        let mode = spec.mode();
        let live = Arc::new(AtomicBool::new(true));
        let delivery = Delivery {
            spec: spec.clone(),
            on_event,
            live: Arc::clone(&live),
        };

        let backend = match self.debounce {
            None => {
                let mut watcher = notify::recommended_watcher(
                    move |res: notify::Result<notify::Event>| match res {
                        Ok(event) => {
                            for (path, kind) in classify(&event) {
                                delivery.deliver(path, kind);
                            }
                        }
                        Err(error) => tracing::warn!(error = %error, "Watcher error"),
                    },
                )?;
                watcher.watch(spec.directory.as_std_path(), mode)?;
                Backend::Immediate(watcher)
            }
            Some(timeout) => {
                let mut debouncer =
                    new_debouncer(timeout, move |res: DebounceEventResult| match res {
                        Ok(events) => {
                            for event in events {
                                let kind = if event.path.exists() {
                                    FileEventKind::Modified
                                } else {
                                    FileEventKind::Removed
                                };
                                delivery.deliver(event.path, kind);
                            }
                        }
                        Err(error) => tracing::warn!(error = %error, "Debouncer error"),
                    })?;
                debouncer
                    .watcher()
                    .watch(spec.directory.as_std_path(), mode)?;
                Backend::Debounced(debouncer)
            }
        };

        tracing::debug!(
            path = %spec.directory,
            recursive = spec.recursive,
            debounced = self.debounce.is_some(),
            "Subscription started"
        );

        Ok(NotifySubscription {
            directory: spec.directory,
            live,
            backend,
        })
    }

    fn release(&self, subscription: NotifySubscription) {
        subscription.live.store(false, Ordering::Release);
        drop(subscription);
    }
}

/// State shared with the notify callback.
struct Delivery {
    spec: WatchSpec,
    on_event: EventCallback,
    live: Arc<AtomicBool>,
}

impl Delivery {
    fn deliver(&self, path: std::path::PathBuf, kind: FileEventKind) {
        if !self.live.load(Ordering::Acquire) {
            return;
        }

        let path = match event_path(path) {
            Ok(path) => path,
            Err(error) => {
                tracing::warn!(error = %error, "Skipping file event");
                return;
            }
        };

        if !self.spec.accepts(&path) {
            tracing::trace!(path = %path, "Filtered out file event");
            return;
        }

        (self.on_event)(FileEvent::new(path, kind));
    }
}

/// Converts a path reported by notify into a UTF-8 path.
fn event_path(path: std::path::PathBuf) -> Result<Utf8PathBuf, WatchError> {
    Utf8PathBuf::try_from(path).map_err(|e| WatchError::non_utf8_path(e.into_path_buf()))
}

enum Backend {
    Immediate(RecommendedWatcher),
    Debounced(Debouncer<RecommendedWatcher>),
}

/// An active [`NotifyWatch`] subscription.
///
/// Dropping the subscription has the same effect as releasing it.
pub struct NotifySubscription {
    directory: Utf8PathBuf,
    live: Arc<AtomicBool>,
    backend: Backend,
}

impl NotifySubscription {
    /// Returns the canonical directory being watched.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// Returns `true` until the subscription is released.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for NotifySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySubscription")
            .field("directory", &self.directory)
            .field("is_live", &self.is_live())
            .finish_non_exhaustive()
    }
}

impl Drop for NotifySubscription {
    fn drop(&mut self) {
        self.live.store(false, Ordering::Release);

        let path = self.directory.as_std_path();
        let result = match &mut self.backend {
            Backend::Immediate(watcher) => watcher.unwatch(path),
            Backend::Debounced(debouncer) => debouncer.watcher().unwatch(path),
        };

        // The directory may already be gone, which also ends the watch
        if let Err(error) = result {
            tracing::debug!(path = %self.directory, error = %error, "Unwatch failed");
        }

        tracing::debug!(path = %self.directory, "Subscription released");
    }
}
