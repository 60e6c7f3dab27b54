//! Change-triggered generator runs for the cfgo-watch daemon.
//!
//! Given a [`ChangeEvent`](cw_core::ChangeEvent) for `<root>/config/<name>.json`,
//! this crate runs
//!
//! ```text
//! cfgo <root>/config/<name>.json <root>/config/generated/<name>.go
//! ```
//!
//! and reports the outcome as a [`Status`](cw_core::Status).
//!
//! # Overview
//!
//! - [`PathResolver`]: pure mapping from a changed file to generator paths
//! - [`CommandRunner`]: process execution seam, [`TokioRunner`] in production
//! - [`Dispatcher`]: ties the two together and reports to a [`StatusSink`]
//!
//! # Flow
//!
//! ```text
//! ChangeEvent ─► PathResolver ─► ensure_output_dir ─► CommandRunner ─► StatusSink
//!                     │                 │                   │
//!                     └─────────────────┴───────────────────┴─► GenerateError
//! ```
//!
//! Every call to [`Dispatcher::on_change`] reports exactly one status, and a
//! failure never affects any other call.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod dispatcher;
pub mod error;
pub mod paths;
pub mod runner;
pub mod status;

pub use dispatcher::{Dispatcher, Generated};
pub use error::GenerateError;
pub use paths::{GenerationPaths, PathResolver, ensure_output_dir};
pub use runner::{CommandRunner, Invocation, ProcessOutput, TokioRunner};
pub use status::{ConsoleSink, MemorySink, StatusSink};
