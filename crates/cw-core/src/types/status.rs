//! Status messages.
//!
//! This module provides the [`Status`] type pushed to a status sink after
//! every generation attempt.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a [`Status`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    /// Informational message, e.g. a successful generation.
    Info,
    /// Error message, e.g. a failed generation.
    Error,
}

impl StatusLevel {
    /// Returns a short lowercase label for this level.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A human-readable status message.
///
/// # Examples
///
/// ```
/// use cw_core::{Status, StatusLevel};
///
/// let status = Status::info("Generated settings.go");
/// assert_eq!(status.level, StatusLevel::Info);
/// assert_eq!(status.to_string(), "info: Generated settings.go");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Severity of the message.
    pub level: StatusLevel,

    /// The message text.
    pub message: String,
}

impl Status {
    /// Creates an informational status.
    #[inline]
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }

    /// Creates an error status.
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }

    /// Returns `true` if this is an error status.
    #[inline]
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.level, StatusLevel::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level.label(), self.message)
    }
}
