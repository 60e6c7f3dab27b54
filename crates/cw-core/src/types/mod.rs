//! Domain types for the cfgo-watch tool.
//!
//! # Module Organization
//!
//! - [`module`] - Module roots, the identity of a watched module
//! - [`event`] - Change notifications scoped to a module
//! - [`status`] - Human-readable status messages pushed to the user
//!
//! All public types are re-exported at this module level and at the crate root:
//!
//! ```
//! use cw_core::{ChangeEvent, ModuleRoot, Status, StatusLevel};
//! ```

mod event;
mod module;
mod status;

pub use event::ChangeEvent;
pub use module::ModuleRoot;
pub use status::{Status, StatusLevel};
