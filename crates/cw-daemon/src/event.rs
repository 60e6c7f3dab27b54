//! Event types for the daemon event loop.
//!
//! # Event Sources
//!
//! - **Initial scan**: one [`Event::Discovered`] once the workspace walk finishes
//! - **Manifest subscription**: [`Event::ManifestCreated`] / [`Event::ManifestDeleted`]
//! - **Module subscriptions**: [`Event::ConfigChanged`] for every written config file
//!
//! Watch callbacks may run on a backend thread, so they only ever send an
//! event. All state changes happen on the event loop.

use std::fmt;

use cw_core::{ChangeEvent, ModuleRoot};
use cw_scanner::DiscoveryReport;

/// Identifies one registration of a module.
///
/// Every successful `register` gets a fresh generation. An event carrying
/// a generation the registry no longer holds belongs to a released
/// subscription and is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    /// Creates a generation from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the generation after this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events processed by the daemon.
#[derive(Debug)]
#[non_exhaustive]
pub enum Event {
    /// The initial workspace scan finished.
    Discovered(DiscoveryReport),

    /// A manifest file appeared or was rewritten.
    ManifestCreated(ModuleRoot),

    /// A manifest file disappeared.
    ManifestDeleted(ModuleRoot),

    /// A configuration file inside a watched module was written.
    ConfigChanged {
        /// Registration that produced the event.
        generation: Generation,
        /// The change itself.
        change: ChangeEvent,
    },
}

impl Event {
    /// Returns `true` if this is a configuration change.
    #[inline]
    #[must_use]
    pub const fn is_config_changed(&self) -> bool {
        matches!(self, Self::ConfigChanged { .. })
    }
}
