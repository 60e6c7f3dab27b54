//! Error types for the cw-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! while walking a workspace for manifest files.

/// Errors that can occur during discovery.
///
/// # Error Recovery Strategy
///
/// - **Walker errors** ([`ScanError::Walk`]): Recoverable - the entry is skipped and recorded
/// - **Non-UTF-8 paths** ([`ScanError::NonUtf8Path`]): Recoverable - the entry is skipped and recorded
/// - **Configuration errors** ([`ScanError::Config`]): Fatal - the walk never starts
///
/// Recoverable errors end up in
/// [`DiscoveryReport::errors`](crate::DiscoveryReport::errors) instead of
/// aborting the scan.
///
/// # Examples
///
/// ```
/// use cw_scanner::ScanError;
///
/// fn handle_error(err: ScanError) {
///     match err {
///         ScanError::Walk(e) => eprintln!("Walk error: {e}"),
///         ScanError::Config(msg) => eprintln!("Config error: {msg}"),
///         ScanError::NonUtf8Path(p) => eprintln!("Invalid path: {}", p.display()),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to read a directory entry.
    ///
    /// Typically a permission error or a symlink loop.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Invalid discovery configuration.
    ///
    /// Indicates that the workspace root is missing or not a directory.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A manifest path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl ScanError {
    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error is recoverable (scanning can continue).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Walk(_) | Self::NonUtf8Path(_))
    }

    /// Returns `true` if this error is fatal (scanning cannot start).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_scan_error_config() {
        let err = ScanError::config("root path does not exist: /missing");
        assert!(!err.is_recoverable());
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/missing"));
    }

    #[test]
    fn test_scan_error_non_utf8() {
        let err = ScanError::NonUtf8Path(PathBuf::from("test"));
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_scan_error_walk() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ScanError::from(ignore::Error::from(io));
        assert!(err.is_recoverable());
        assert!(err.to_string().starts_with("failed to walk directory"));
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::Config("test error".to_owned());
        assert_eq!(err.to_string(), "invalid configuration: test error");
    }
}
