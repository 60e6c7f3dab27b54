//! Daemon-level error types.
//!
//! This module provides the [`DaemonError`] type for the few conditions
//! that stop the daemon from starting. Everything that happens after
//! startup is logged or reported as a status instead.

use thiserror::Error;

/// Errors that can occur while starting the daemon.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DaemonError {
    /// A watch subscription could not be created.
    #[error("watcher error: {0}")]
    Watch(#[from] cw_watcher::WatchError),

    /// The configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] cw_core::ConfigError),
}
