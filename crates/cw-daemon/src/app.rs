//! Daemon state and event handling.
//!
//! # Architecture
//!
//! ```text
//! App
//!  ├── registry: ModuleRegistry     # one subscription per module config dir
//!  ├── manifests: Subscription      # recursive manifest watch on the workspace
//!  ├── dispatcher: Dispatcher       # spawns one task per config change
//!  └── events: mpsc channel         # fed by every watch callback
//! ```
//!
//! Every state change happens in [`App::handle_event`], on the task that
//! owns the `App`. Watch callbacks only send events.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use cw_core::{Config, DiscoveryConfig};
use cw_generator::{CommandRunner, Dispatcher, GenerateError, Generated, StatusSink};
use cw_watcher::WatchCapability;

use crate::discovery;
use crate::event::Event;
use crate::registry::ModuleRegistry;

/// Handle to a spawned generation.
pub type DispatchHandle = JoinHandle<Result<Generated, GenerateError>>;

/// The running daemon.
pub struct App<C: WatchCapability, R: CommandRunner, S: StatusSink> {
    config: Config,
    workspace_root: Utf8PathBuf,
    capability: Arc<C>,
    registry: ModuleRegistry<C>,
    dispatcher: Dispatcher<R, S>,
    manifests: Option<C::Subscription>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
}

impl<C: WatchCapability, R: CommandRunner, S: StatusSink> App<C, R, S> {
    /// Creates the daemon without starting discovery.
    ///
    /// The workspace root is canonicalized so that roots found by the walk
    /// and roots reported by the watcher compare equal. A root that cannot
    /// be resolved is used as given and logged.
    pub fn new(config: Config, capability: Arc<C>, runner: Arc<R>, sink: Arc<S>) -> Self {
        let workspace_root = match config.discovery.workspace_root.canonicalize_utf8() {
            Ok(root) => root,
            Err(error) => {
                warn!(
                    root = %config.discovery.workspace_root,
                    error = %error,
                    "Cannot resolve workspace root"
                );
                config.discovery.workspace_root.clone()
            }
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let registry = ModuleRegistry::new(Arc::clone(&capability), config.layout.clone(), events_tx.clone());
        let dispatcher = Dispatcher::new(config.generator.clone(), config.layout.clone(), runner, sink);

        Self {
            config,
            workspace_root,
            capability,
            registry,
            dispatcher,
            manifests: None,
            events_tx,
            events_rx,
        }
    }

    /// Returns the canonical workspace root.
    #[must_use]
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Returns the module registry.
    #[must_use]
    pub const fn registry(&self) -> &ModuleRegistry<C> {
        &self.registry
    }

    /// Returns `true` while the manifest subscription is installed.
    #[must_use]
    pub const fn is_watching_manifests(&self) -> bool {
        self.manifests.is_some()
    }

    /// Installs the manifest subscription, then starts the initial scan.
    ///
    /// The subscription comes first so a manifest created while the walk
    /// runs is still seen. Failing to install it is logged; modules found
    /// by the walk are watched regardless.
    ///
    /// The returned handle completes once the scan result has been queued.
    pub fn start(&mut self) -> JoinHandle<()> {
        if self.config.watch.watch_manifests && self.manifests.is_none() {
            match discovery::watch_manifests(
                self.capability.as_ref(),
                &self.workspace_root,
                &self.config.discovery,
                self.events_tx.clone(),
            ) {
                Ok(subscription) => self.manifests = Some(subscription),
                Err(error) => warn!(error = %error, "Manifest watching unavailable"),
            }
        }

        let scan = DiscoveryConfig {
            workspace_root: self.workspace_root.clone(),
            ..self.config.discovery.clone()
        };
        discovery::spawn_initial_scan(scan, self.events_tx.clone())
    }

    /// Applies one event.
    ///
    /// Returns the handle of the generation task when the event caused one.
    /// Callers may drop it; the task keeps running.
    pub fn handle_event(&mut self, event: Event) -> Option<DispatchHandle> {
        match event {
            Event::Discovered(report) => {
                let found = report.roots.len();
                let manifest_name = &self.config.discovery.manifest_name;
                let registry = &mut self.registry;
                // The manifest may have been deleted between the walk and now,
                // and its ManifestDeleted event already handled.
                let watched = report
                    .roots
                    .into_iter()
                    .filter(|root| {
                        if !root.as_path().join(manifest_name).is_file() {
                            debug!(root = %root, "Manifest gone since discovery, skipping");
                            return false;
                        }
                        registry.register(root.clone())
                    })
                    .count();
                info!(
                    modules = found,
                    watched,
                    skipped_entries = report.errors.len(),
                    "Initial discovery complete"
                );
                None
            }
            Event::ManifestCreated(root) => {
                debug!(root = %root, "Manifest appeared");
                self.registry.register(root);
                None
            }
            Event::ManifestDeleted(root) => {
                debug!(root = %root, "Manifest removed");
                self.registry.unregister(&root);
                None
            }
            Event::ConfigChanged { generation, change } => {
                if !self.registry.is_live(&change.root, generation) {
                    trace!(root = %change.root, path = %change.path, "Dropping event from released watcher");
                    return None;
                }
                debug!(root = %change.root, path = %change.path, "Configuration changed");
                Some(self.dispatcher.spawn(change))
            }
        }
    }

    /// Applies every event that is already queued.
    ///
    /// Returns the handles of the generations that were started.
    pub fn drain(&mut self) -> Vec<DispatchHandle> {
        let mut handles = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            handles.extend(self.handle_event(event));
        }
        handles
    }

    /// Waits for the next event.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    /// Runs until `shutdown` is cancelled, then releases every watcher.
    ///
    /// Generation tasks still in flight are left to finish on their own.
    pub async fn run(mut self, shutdown: CancellationToken) {
        drop(self.start());
        info!(root = %self.workspace_root, "Watching workspace");

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }

                event = self.events_rx.recv() => match event {
                    Some(event) => {
                        drop(self.handle_event(event));
                    }
                    None => break,
                },
            }
        }

        self.shutdown();
    }

    /// Releases the manifest subscription and every module subscription.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.manifests.take() {
            self.capability.release(subscription);
            debug!("Released manifest watcher");
        }
        self.registry.shutdown();
    }
}

impl<C: WatchCapability, R: CommandRunner, S: StatusSink> Drop for App<C, R, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<C: WatchCapability, R: CommandRunner, S: StatusSink> std::fmt::Debug for App<C, R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("workspace_root", &self.workspace_root)
            .field("registry", &self.registry)
            .field("watching_manifests", &self.manifests.is_some())
            .finish_non_exhaustive()
    }
}
