//! Continuous module discovery.
//!
//! The initial walk lives in `cw-scanner`. This module keeps the registry in
//! sync afterwards by watching the whole workspace for manifest files, and
//! runs the initial walk off the event loop.

use camino::Utf8Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use cw_core::{DiscoveryConfig, ModuleRoot};
use cw_watcher::{
    CompositeFilter, FileEvent, FileEventKind, FileNameFilter, SkipDirsFilter, WatchCapability, WatchSpec,
    callback,
};

use crate::error::DaemonError;
use crate::event::Event;

/// Builds the recursive spec matching manifest files under `workspace_root`.
#[must_use]
pub fn manifest_spec(workspace_root: &Utf8Path, config: &DiscoveryConfig) -> WatchSpec {
    let filter = CompositeFilter::new()
        .and(FileNameFilter::new(config.manifest_name.clone()))
        .and(SkipDirsFilter::new(workspace_root, config.ignore_dirs.iter().cloned()));

    WatchSpec::new(workspace_root)
        .recursive(true)
        .with_filter(filter)
}

/// Subscribes to manifest creation and deletion under `workspace_root`.
///
/// Creations and rewrites become [`Event::ManifestCreated`], deletions
/// become [`Event::ManifestDeleted`].
///
/// # Errors
///
/// Returns [`DaemonError::Watch`] if the subscription cannot be created.
pub fn watch_manifests<C: WatchCapability>(
    capability: &C,
    workspace_root: &Utf8Path,
    config: &DiscoveryConfig,
    events: mpsc::UnboundedSender<Event>,
) -> Result<C::Subscription, DaemonError> {
    let spec = manifest_spec(workspace_root, config);

    let on_event = callback(move |event: FileEvent| {
        let Some(root) = ModuleRoot::from_manifest(&event.path) else {
            return;
        };
        let event = match event.kind {
            FileEventKind::Created | FileEventKind::Modified => Event::ManifestCreated(root),
            FileEventKind::Removed => Event::ManifestDeleted(root),
        };
        let _ = events.send(event);
    });

    let subscription = capability.subscribe(spec, on_event)?;
    tracing::info!(root = %workspace_root, manifest = %config.manifest_name, "Watching for manifests");
    Ok(subscription)
}

/// Runs the initial workspace walk on the blocking pool.
///
/// The report is posted as [`Event::Discovered`]. A workspace that cannot be
/// walked is logged and produces no event; the daemon carries on with
/// whatever the manifest subscription finds later.
pub fn spawn_initial_scan(config: DiscoveryConfig, events: mpsc::UnboundedSender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::task::spawn_blocking(move || cw_scanner::discover_all(&config)).await {
            Ok(Ok(report)) => {
                for error in &report.errors {
                    tracing::warn!(error = %error, "Discovery skipped an entry");
                }
                let _ = events.send(Event::Discovered(report));
            }
            Ok(Err(error)) => {
                tracing::error!(error = %error, "Module discovery failed, continuing without initial modules");
            }
            Err(error) => {
                tracing::error!(error = %error, "Module discovery task failed");
            }
        }
    })
}
