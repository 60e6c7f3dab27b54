//! Module discovery for the cfgo-watch daemon.
//!
//! This crate answers one question: which directories under a workspace are
//! modules? A module is any directory containing a manifest file (`go.mod` by
//! default).
//!
//! # Overview
//!
//! - [`ModuleWalker`]: directory traversal built on the `ignore` crate
//! - [`DiscoveryReport`]: sorted module roots plus the entries that failed
//! - [`discover_all`]: one-shot convenience used by the daemon and the CLI
//!
//! Discovery is best-effort. Unreadable entries are logged and recorded in
//! the report, and the walk carries on with whatever it can see.
//!
//! # Example
//!
//! ```no_run
//! use cw_core::DiscoveryConfig;
//! use cw_scanner::discover_all;
//!
//! # fn example() -> Result<(), cw_scanner::ScanError> {
//! let report = discover_all(&DiscoveryConfig::default())?;
//! println!("{} modules, {} unreadable entries", report.roots.len(), report.errors.len());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod walker;

pub use error::ScanError;
pub use walker::{DiscoveryReport, ModuleWalker};

use cw_core::DiscoveryConfig;

/// Enumerates every module root under the configured workspace.
///
/// # Errors
///
/// Returns [`ScanError::Config`] if the workspace root is missing or not a
/// directory. Failures on individual entries are reported through
/// [`DiscoveryReport::errors`] instead.
pub fn discover_all(config: &DiscoveryConfig) -> Result<DiscoveryReport, ScanError> {
    let walker = ModuleWalker::new(config)?;
    tracing::info!(root = %walker.root(), manifest = %config.manifest_name, "Discovering modules");
    Ok(walker.discover())
}
