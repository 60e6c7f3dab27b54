//! An in-memory [`WatchCapability`] driven by explicit calls.
//!
//! [`ManualWatch`] never touches the filesystem notification API. Events are
//! injected with [`ManualWatch::emit`] and delivered synchronously to every
//! live subscription whose [`WatchSpec`] accepts the path. This makes event
//! ordering fully deterministic, which is what the daemon's lifecycle tests
//! rely on.

use std::sync::Arc;

use camino::Utf8Path;
use parking_lot::Mutex;

use cw_core::FxHashMap;

use crate::error::WatchError;
use crate::events::FileEvent;
use crate::watcher::{EventCallback, WatchCapability, WatchSpec};

#[derive(Default)]
struct State {
    next_id: u64,
    subscriptions: FxHashMap<u64, (WatchSpec, EventCallback)>,
}

/// A [`WatchCapability`] whose events come from [`ManualWatch::emit`].
///
/// Clones share the same set of subscriptions.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use cw_watcher::{callback, FileEvent, ManualWatch, WatchCapability, WatchSpec};
///
/// let watch = ManualWatch::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
///
/// let sub = watch
///     .subscribe(WatchSpec::new("/proj/config"), callback(move |_| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }))
///     .unwrap();
///
/// assert_eq!(watch.emit(FileEvent::modified("/proj/config/a.json")), 1);
/// watch.release(sub);
/// assert_eq!(watch.emit(FileEvent::modified("/proj/config/a.json")), 0);
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone, Default)]
pub struct ManualWatch {
    state: Arc<Mutex<State>>,
}

impl ManualWatch {
    /// Creates a capability with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every matching subscription.
    ///
    /// Returns the number of callbacks invoked.
    pub fn emit(&self, event: FileEvent) -> usize {
        // Callbacks run without the lock held so they may subscribe or release
        let targets: Vec<EventCallback> = {
            let state = self.state.lock();
            state
                .subscriptions
                .values()
                .filter(|(spec, _)| spec.accepts(&event.path))
                .map(|(_, on_event)| Arc::clone(on_event))
                .collect()
        };

        for on_event in &targets {
            on_event(event.clone());
        }

        targets.len()
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Returns `true` if some live subscription watches `directory`.
    #[must_use]
    pub fn is_watching(&self, directory: &Utf8Path) -> bool {
        self.state
            .lock()
            .subscriptions
            .values()
            .any(|(spec, _)| spec.directory == directory)
    }
}

impl std::fmt::Debug for ManualWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualWatch")
            .field("active_subscriptions", &self.active_subscriptions())
            .finish()
    }
}

/// Handle returned by [`ManualWatch::subscribe`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ManualSubscription {
    id: u64,
}

impl WatchCapability for ManualWatch {
    type Subscription = ManualSubscription;

    fn subscribe(
        &self,
        spec: WatchSpec,
        on_event: EventCallback,
    ) -> Result<ManualSubscription, WatchError> {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscriptions.insert(id, (spec, on_event));
        Ok(ManualSubscription { id })
    }

    fn release(&self, subscription: ManualSubscription) {
        self.state.lock().subscriptions.remove(&subscription.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ExtensionFilter;
    use crate::watcher::callback;

    fn recorder() -> (EventCallback, Arc<Mutex<Vec<FileEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (callback(move |event| sink.lock().push(event)), seen)
    }

    #[test]
    fn test_emit_respects_spec() {
        let watch = ManualWatch::new();
        let (on_event, seen) = recorder();
        let spec = WatchSpec::new("/p/config").with_filter(ExtensionFilter::new(&["json"]));
        let _sub = watch.subscribe(spec, on_event).unwrap();

        assert_eq!(watch.emit(FileEvent::modified("/p/config/a.json")), 1);
        assert_eq!(watch.emit(FileEvent::modified("/p/config/a.txt")), 0);
        assert_eq!(watch.emit(FileEvent::modified("/p/config/sub/a.json")), 0);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/p/config/a.json");
    }

    #[test]
    fn test_release_stops_delivery() {
        let watch = ManualWatch::new();
        let (on_event, seen) = recorder();
        let sub = watch.subscribe(WatchSpec::new("/p/config"), on_event).unwrap();
        assert!(watch.is_watching(Utf8Path::new("/p/config")));

        watch.release(sub);
        assert_eq!(watch.active_subscriptions(), 0);
        assert!(!watch.is_watching(Utf8Path::new("/p/config")));
        assert_eq!(watch.emit(FileEvent::created("/p/config/a.json")), 0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_clones_share_subscriptions() {
        let watch = ManualWatch::new();
        let other = watch.clone();
        let (on_event, _seen) = recorder();
        let _sub = other.subscribe(WatchSpec::new("/p/config"), on_event).unwrap();
        assert_eq!(watch.active_subscriptions(), 1);
    }

    #[test]
    fn test_callback_may_release_reentrantly() {
        let watch = ManualWatch::new();
        let slot: Arc<Mutex<Option<ManualSubscription>>> = Arc::new(Mutex::new(None));

        let inner_watch = watch.clone();
        let inner_slot = Arc::clone(&slot);
        let on_event = callback(move |_| {
            if let Some(sub) = inner_slot.lock().take() {
                inner_watch.release(sub);
            }
        });

        let sub = watch.subscribe(WatchSpec::new("/p/config"), on_event).unwrap();
        *slot.lock() = Some(sub);

        assert_eq!(watch.emit(FileEvent::modified("/p/config/a.json")), 1);
        assert_eq!(watch.active_subscriptions(), 0);
    }
}
