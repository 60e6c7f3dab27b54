//! Error types for the cw-generator crate.
//!
//! This module provides the [`GenerateError`] type. Every variant is terminal
//! for the change event that produced it and for nothing else.

use camino::Utf8PathBuf;

/// Errors that can occur while handling one configuration change.
///
/// # Examples
///
/// ```
/// use cw_generator::GenerateError;
///
/// let err = GenerateError::execution("cfgo", Some(1), "invalid JSON\n");
/// assert_eq!(err.diagnostic(), "invalid JSON");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The changed path has no usable file name.
    #[error("cannot derive a file name from {0}")]
    InvalidPath(Utf8PathBuf),

    /// The generated-output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The generator process could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// Program that was being started.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The generator ran and reported failure.
    #[error("{program} exited unsuccessfully: {}", describe_exit(*.code, .stderr))]
    Execution {
        /// Program that failed.
        program: String,
        /// Exit code, or `None` if the process was terminated by a signal.
        code: Option<i32>,
        /// Captured error stream.
        stderr: String,
    },
}

impl GenerateError {
    /// Creates a new [`GenerateError::OutputDirectory`] error.
    #[inline]
    pub fn output_directory(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::OutputDirectory {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`GenerateError::Launch`] error.
    #[inline]
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }

    /// Creates a new [`GenerateError::Execution`] error.
    #[inline]
    pub fn execution(program: impl Into<String>, code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::Execution {
            program: program.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Returns the most specific diagnostic text available.
    ///
    /// Execution failures prefer the captured error stream. Launch failures
    /// use the operating system's message.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::InvalidPath(_) | Self::OutputDirectory { .. } => self.to_string(),
            Self::Launch { source, .. } => source.to_string(),
            Self::Execution { code, stderr, .. } => describe_exit(*code, stderr),
        }
    }

    /// Returns `true` if the generator itself ran and failed.
    #[inline]
    #[must_use]
    pub const fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }
}

fn describe_exit(code: Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_owned();
    }
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_owned(),
    }
}
