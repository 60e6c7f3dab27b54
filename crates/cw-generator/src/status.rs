//! Where generation outcomes are reported.

use std::io::Write;

use parking_lot::Mutex;

use cw_core::{Status, StatusLevel};

/// Receives one [`Status`] per handled change.
pub trait StatusSink: Send + Sync + 'static {
    /// Reports a status.
    fn report(&self, status: Status);
}

/// Writes informational statuses to stdout and errors to stderr.
///
/// Every status is also emitted as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl StatusSink for ConsoleSink {
    fn report(&self, status: Status) {
        // A closed stdout/stderr must not take the daemon down
        let _ = match status.level {
            StatusLevel::Info => {
                tracing::info!(message = %status.message, "Status");
                writeln!(std::io::stdout().lock(), "{}", status.message)
            }
            StatusLevel::Error => {
                tracing::error!(message = %status.message, "Status");
                writeln!(std::io::stderr().lock(), "{}", status.message)
            }
        };
    }
}

/// Records statuses in memory.
///
/// # Examples
///
/// ```
/// use cw_core::Status;
/// use cw_generator::{MemorySink, StatusSink};
///
/// let sink = MemorySink::new();
/// sink.report(Status::info("cfgo: Generated a.go"));
///
/// assert_eq!(sink.messages(), vec!["cfgo: Generated a.go".to_owned()]);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    statuses: Mutex<Vec<Status>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every status reported so far.
    #[must_use]
    pub fn statuses(&self) -> Vec<Status> {
        self.statuses.lock().clone()
    }

    /// Returns the message of every status reported so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.statuses.lock().iter().map(|s| s.message.clone()).collect()
    }

    /// Returns the number of statuses reported so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.lock().len()
    }

    /// Returns `true` if nothing has been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.lock().is_empty()
    }
}

impl StatusSink for MemorySink {
    fn report(&self, status: Status) {
        self.statuses.lock().push(status);
    }
}

impl<S: StatusSink> StatusSink for std::sync::Arc<S> {
    fn report(&self, status: Status) {
        (**self).report(status);
    }
}
