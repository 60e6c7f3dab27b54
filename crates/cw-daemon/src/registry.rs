//! The set of watched modules.
//!
//! [`ModuleRegistry`] exclusively owns one watch subscription per module.
//! It is only ever touched from the event loop, so plain `&mut self` methods
//! are enough. A check and the matching insert or removal always happen in
//! one synchronous step.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use camino::Utf8PathBuf;
use tokio::sync::mpsc;

use cw_core::{ChangeEvent, FxHashMap, LayoutConfig, ModuleRoot};
use cw_watcher::{ExtensionFilter, FileEvent, WatchCapability, WatchSpec, callback};

use crate::event::{Event, Generation};

struct WatchedModule<S> {
    generation: Generation,
    config_dir: Utf8PathBuf,
    subscription: S,
}

/// Registry of module roots and their configuration-directory subscriptions.
///
/// Invariant: every entry holds exactly one live subscription, and no root
/// appears twice.
pub struct ModuleRegistry<C: WatchCapability> {
    capability: Arc<C>,
    layout: LayoutConfig,
    events: mpsc::UnboundedSender<Event>,
    modules: FxHashMap<ModuleRoot, WatchedModule<C::Subscription>>,
    next_generation: Generation,
}

impl<C: WatchCapability> ModuleRegistry<C> {
    /// Creates an empty registry.
    ///
    /// Configuration changes of registered modules are sent to `events`.
    #[must_use]
    pub fn new(capability: Arc<C>, layout: LayoutConfig, events: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            capability,
            layout,
            events,
            modules: FxHashMap::default(),
            next_generation: Generation::new(0),
        }
    }

    /// Starts watching `root`.
    ///
    /// Returns `false` without doing anything if the root is already
    /// registered or has no configuration directory. Neither case is an
    /// error. A failed subscription is logged and also returns `false`.
    pub fn register(&mut self, root: ModuleRoot) -> bool {
        let slot = match self.modules.entry(root) {
            Entry::Occupied(entry) => {
                tracing::trace!(root = %entry.key(), "Module already registered");
                return false;
            }
            Entry::Vacant(slot) => slot,
        };

        let config_dir = slot.key().config_dir(&self.layout);
        if !config_dir.is_dir() {
            tracing::debug!(root = %slot.key(), "No configuration directory, not watching");
            return false;
        }

        let generation = self.next_generation;
        let spec = WatchSpec::new(config_dir.clone())
            .with_filter(ExtensionFilter::single(self.layout.input_extension.clone()));

        let events = self.events.clone();
        let owner = slot.key().clone();
        let on_event = callback(move |event: FileEvent| {
            if !event.kind.is_write() {
                return;
            }
            let change = ChangeEvent::new(owner.clone(), event.path);
            // The loop is gone during shutdown; nothing left to notify
            let _ = events.send(Event::ConfigChanged { generation, change });
        });

        match self.capability.subscribe(spec, on_event) {
            Ok(subscription) => {
                self.next_generation = generation.next();
                tracing::info!(root = %slot.key(), generation = %generation, "Watching module");
                slot.insert(WatchedModule {
                    generation,
                    config_dir,
                    subscription,
                });
                true
            }
            Err(error) => {
                tracing::warn!(root = %slot.key(), error = %error, "Failed to watch configuration directory");
                false
            }
        }
    }

    /// Stops watching `root`.
    ///
    /// The subscription is released before this returns. Returns `false` if
    /// the root was not registered.
    pub fn unregister(&mut self, root: &ModuleRoot) -> bool {
        let Some(module) = self.modules.remove(root) else {
            return false;
        };

        self.capability.release(module.subscription);
        tracing::info!(root = %root, config_dir = %module.config_dir, "Stopped watching module");
        true
    }

    /// Unregisters every module. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.modules.is_empty() {
            return;
        }

        let count = self.modules.len();
        for (_, module) in self.modules.drain() {
            self.capability.release(module.subscription);
        }
        tracing::info!(modules = count, "Released all module watchers");
    }

    /// Returns `true` if `root` is registered under `generation`.
    #[must_use]
    pub fn is_live(&self, root: &ModuleRoot, generation: Generation) -> bool {
        self.modules
            .get(root)
            .is_some_and(|module| module.generation == generation)
    }

    /// Returns `true` if `root` is registered.
    #[must_use]
    pub fn contains(&self, root: &ModuleRoot) -> bool {
        self.modules.contains_key(root)
    }

    /// Returns the number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no module is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Returns the registered roots in sorted order.
    #[must_use]
    pub fn roots(&self) -> Vec<ModuleRoot> {
        let mut roots: Vec<_> = self.modules.keys().cloned().collect();
        roots.sort_unstable();
        roots
    }

    /// Returns the layout used to locate configuration directories.
    #[must_use]
    pub const fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

impl<C: WatchCapability> Drop for ModuleRegistry<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<C: WatchCapability> std::fmt::Debug for ModuleRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.roots())
            .field("next_generation", &self.next_generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use cw_watcher::ManualWatch;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        base: Utf8PathBuf,
        watch: Arc<ManualWatch>,
        registry: ModuleRegistry<ManualWatch>,
        rx: mpsc::UnboundedReceiver<Event>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
            let watch = Arc::new(ManualWatch::new());
            let (tx, rx) = mpsc::unbounded_channel();
            let registry = ModuleRegistry::new(Arc::clone(&watch), LayoutConfig::default(), tx);
            Self {
                _dir: dir,
                base,
                watch,
                registry,
                rx,
            }
        }

        fn module(&self, name: &str, with_config: bool) -> ModuleRoot {
            let root = self.base.join(name);
            fs::create_dir_all(&root).unwrap();
            fs::write(root.join("go.mod"), "module x\n").unwrap();
            if with_config {
                fs::create_dir_all(root.join("config")).unwrap();
            }
            ModuleRoot::new(root)
        }

        fn pending(&mut self) -> Vec<Event> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push(event);
            }
            events
        }
    }

    #[test]
    fn test_register_without_config_dir_is_noop() {
        let mut fx = Fixture::new();
        let root = fx.module("svc", false);

        assert!(!fx.registry.register(root.clone()));
        assert!(!fx.registry.contains(&root));
        assert_eq!(fx.watch.active_subscriptions(), 0);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut fx = Fixture::new();
        let root = fx.module("svc", true);

        assert!(fx.registry.register(root.clone()));
        assert!(!fx.registry.register(root.clone()));
        assert!(!fx.registry.register(root.clone()));

        assert_eq!(fx.registry.len(), 1);
        assert_eq!(fx.watch.active_subscriptions(), 1);
        assert!(fx.watch.is_watching(&root.config_dir(&LayoutConfig::default())));
    }

    #[test]
    fn test_only_direct_json_writes_are_forwarded() {
        let mut fx = Fixture::new();
        let root = fx.module("svc", true);
        fx.registry.register(root.clone());
        let config = root.as_path().join("config");

        fx.watch.emit(FileEvent::created(config.join("a.json")));
        fx.watch.emit(FileEvent::modified(config.join("a.json")));
        fx.watch.emit(FileEvent::removed(config.join("a.json")));
        fx.watch.emit(FileEvent::modified(config.join("notes.txt")));
        fx.watch.emit(FileEvent::modified(config.join("generated/a.json")));

        let events = fx.pending();
        assert_eq!(events.len(), 2);
        for event in events {
            let Event::ConfigChanged { generation, change } = event else {
                panic!("unexpected event");
            };
            assert!(fx.registry.is_live(&root, generation));
            assert_eq!(change.root, root);
            assert_eq!(change.file_name(), Some("a.json"));
        }
    }

    #[test]
    fn test_unregister_releases_subscription() {
        let mut fx = Fixture::new();
        let root = fx.module("svc", true);
        fx.registry.register(root.clone());

        assert!(fx.registry.unregister(&root));
        assert!(!fx.registry.unregister(&root));
        assert_eq!(fx.watch.active_subscriptions(), 0);

        assert_eq!(fx.watch.emit(FileEvent::modified(root.as_path().join("config/a.json"))), 0);
        assert!(fx.pending().is_empty());
    }

    #[test]
    fn test_reregistration_gets_new_generation() {
        let mut fx = Fixture::new();
        let root = fx.module("svc", true);

        fx.registry.register(root.clone());
        fx.watch.emit(FileEvent::modified(root.as_path().join("config/a.json")));
        let Some(Event::ConfigChanged { generation: old, .. }) = fx.pending().pop() else {
            panic!("expected a change");
        };

        fx.registry.unregister(&root);
        fx.registry.register(root.clone());

        assert!(!fx.registry.is_live(&root, old));
        assert!(fx.registry.is_live(&root, old.next()));
    }

    #[test]
    fn test_config_dir_created_later_needs_reregistration() {
        let mut fx = Fixture::new();
        let root = fx.module("svc", false);
        assert!(!fx.registry.register(root.clone()));

        fs::create_dir_all(root.as_path().join("config")).unwrap();
        assert!(!fx.registry.contains(&root));

        assert!(fx.registry.register(root.clone()));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut fx = Fixture::new();
        fx.registry.shutdown();

        let a = fx.module("a", true);
        let b = fx.module("b", true);
        fx.registry.register(a);
        fx.registry.register(b);
        assert_eq!(fx.watch.active_subscriptions(), 2);

        fx.registry.shutdown();
        fx.registry.shutdown();
        assert!(fx.registry.is_empty());
        assert_eq!(fx.watch.active_subscriptions(), 0);
    }

    #[test]
    fn test_drop_releases_everything() {
        let fx = Fixture::new();
        let root = fx.module("svc", true);
        let watch = Arc::clone(&fx.watch);
        let Fixture { mut registry, _dir, .. } = fx;
        registry.register(root);
        assert_eq!(watch.active_subscriptions(), 1);

        drop(registry);
        assert_eq!(watch.active_subscriptions(), 0);
    }

    #[test]
    fn test_roots_sorted() {
        let mut fx = Fixture::new();
        let b = fx.module("b", true);
        let a = fx.module("a", true);
        fx.registry.register(b.clone());
        fx.registry.register(a.clone());

        assert_eq!(fx.registry.roots(), vec![a, b]);
        assert!(!fx.registry.contains(&ModuleRoot::new(Utf8Path::new("/elsewhere"))));
    }
}
