//! Core types, errors, and configuration for the cfgo-watch tool.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - [`Config`] and its sections, loadable from a partial JSON file
//! - [`ConfigError`] for configuration failures
//! - Domain types ([`ModuleRoot`], [`ChangeEvent`], [`Status`])
//! - The `FxHashMap` alias (faster than std for path keys)
//!
//! # Crate Dependencies
//!
//! ```text
//! cw-cli ──► cw-daemon ──► cw-generator ──► cw-core
//!                     ├──► cw-scanner ────►
//!                     └──► cw-watcher ────►
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod types;

pub use config::{Config, DiscoveryConfig, GeneratorConfig, LayoutConfig, WatchConfig};
pub use error::ConfigError;
pub use hash::{FxHashMap, fx_hash_map};
pub use types::{ChangeEvent, ModuleRoot, Status, StatusLevel};
