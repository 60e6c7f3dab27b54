//! Directory watch subscriptions for the cfgo-watch daemon.
//!
//! This crate turns "tell me when files in this directory change" into a
//! small capability trait, [`WatchCapability`], with two implementations:
//!
//! - [`NotifyWatch`]: native filesystem notifications via `notify`, with
//!   optional debouncing through `notify-debouncer-mini`
//! - [`ManualWatch`]: an in-memory fake whose events are injected by hand
//!
//! # Overview
//!
//! A subscription is described by a [`WatchSpec`]: a directory, whether to
//! include subdirectories, and a [`FileFilter`]. Every accepted change is
//! handed to the subscription's [`EventCallback`] as a [`FileEvent`]. The
//! daemon uses one recursive subscription for manifest files and one
//! non-recursive subscription per module configuration directory.
//!
//! # Crate Dependencies
//!
//! ```text
//! cw-cli ──► cw-daemon ──► cw-watcher ──► cw-core
//!                      ├─► cw-scanner ──►
//!                      └─► cw-generator ─►
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::mpsc;
//! use cw_core::WatchConfig;
//! use cw_watcher::{callback, ExtensionFilter, NotifyWatch, WatchCapability, WatchSpec};
//!
//! # fn example() -> Result<(), cw_watcher::WatchError> {
//! let (tx, rx) = mpsc::channel();
//! let watch = NotifyWatch::new(&WatchConfig::default());
//!
//! let spec = WatchSpec::new("/proj/config").with_filter(ExtensionFilter::new(&["json"]));
//! let subscription = watch.subscribe(spec, callback(move |event| {
//!     let _ = tx.send(event);
//! }))?;
//!
//! while let Ok(event) = rx.recv() {
//!     println!("{:?}: {}", event.kind, event.path);
//! }
//!
//! watch.release(subscription);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! ```
//! use cw_watcher::WatchError;
//!
//! fn handle_watch_error(err: WatchError) {
//!     if err.is_fatal() {
//!         eprintln!("Subscription failed: {err}");
//!     } else {
//!         eprintln!("Warning: {err}");
//!     }
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod filter;
pub mod manual;
pub mod watcher;

// Re-export error types
pub use error::WatchError;

// Re-export event types
pub use events::{FileEvent, FileEventKind};

// Re-export filter types
pub use filter::{
    AcceptAllFilter, CompositeFilter, ExtensionFilter, FileFilter, FileNameFilter, SkipDirsFilter,
};

// Re-export capability types
pub use manual::{ManualSubscription, ManualWatch};
pub use watcher::{
    EventCallback, NotifySubscription, NotifyWatch, WatchCapability, WatchSpec, callback,
};
