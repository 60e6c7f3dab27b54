//! The cfgo-watch daemon.
//!
//! This crate wires discovery, watching and generation together into one
//! long-running event loop.
//!
//! # Architecture
//!
//! ```text
//! crates/cw-daemon/src/
//!   lib.rs        # run / run_with entry points
//!   app.rs        # App: event loop state and handling
//!   registry.rs   # ModuleRegistry: one watch per module config dir
//!   discovery.rs  # manifest subscription + initial scan task
//!   event.rs      # Event, Generation
//!   error.rs      # DaemonError
//! ```
//!
//! # Event Flow
//!
//! ```text
//! initial scan ──────────────┐
//! manifest subscription ─────┼──► mpsc ──► App::handle_event ──► ModuleRegistry
//! module subscriptions ──────┘                    │
//!                                                 └──► Dispatcher::spawn ──► StatusSink
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use cw_core::Config;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), cw_daemon::DaemonError> {
//! let shutdown = CancellationToken::new();
//! cw_daemon::run(Config::default(), shutdown).await
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod app;
pub mod discovery;
pub mod error;
pub mod event;
pub mod registry;

use std::sync::Arc;

use cw_core::Config;
use cw_generator::{CommandRunner, ConsoleSink, StatusSink, TokioRunner};
use cw_watcher::{NotifyWatch, WatchCapability};
use tokio_util::sync::CancellationToken;
use tracing::info;

// Public re-exports
pub use app::{App, DispatchHandle};
pub use error::DaemonError;
pub use event::{Event, Generation};
pub use registry::ModuleRegistry;

/// Runs the daemon with native file watching, real processes and console
/// output until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`DaemonError::Config`] if the configuration is invalid.
pub async fn run(config: Config, shutdown: CancellationToken) -> Result<(), DaemonError> {
    let capability = Arc::new(NotifyWatch::new(&config.watch));
    run_with(config, capability, Arc::new(TokioRunner), Arc::new(ConsoleSink), shutdown).await
}

/// Runs the daemon with the given backends until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`DaemonError::Config`] if the configuration is invalid.
pub async fn run_with<C, R, S>(
    config: Config,
    capability: Arc<C>,
    runner: Arc<R>,
    sink: Arc<S>,
    shutdown: CancellationToken,
) -> Result<(), DaemonError>
where
    C: WatchCapability,
    R: CommandRunner,
    S: StatusSink,
{
    config.validate()?;

    if config.watch.is_debounced() {
        info!(debounce_ms = config.watch.debounce_ms, "Debouncing change notifications");
    }

    App::new(config, capability, runner, sink).run(shutdown).await;

    info!("Daemon stopped");
    Ok(())
}
