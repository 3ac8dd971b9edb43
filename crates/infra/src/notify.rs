//! User-visible feedback channel.
//!
//! Every failure a tracker action surfaces (and every success toast) goes
//! through a [`Notifier`]. Presentation belongs to the front end.

use std::sync::Mutex;
use std::time::Duration;

use trackers_core::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// How long the message should stay on screen.
    pub duration: Duration,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info, Duration::from_secs(3))
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success, Duration::from_secs(3))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error, Duration::from_secs(5))
    }

    pub fn new(message: impl Into<String>, severity: Severity, duration: Duration) -> Self {
        Self {
            message: message.into(),
            severity,
            duration,
        }
    }
}

impl From<&TrackerError> for Notification {
    fn from(err: &TrackerError) -> Self {
        if err.is_persistence_warning() {
            Notification::new(err.to_string(), Severity::Info, Duration::from_secs(5))
        } else {
            Notification::error(err.to_string())
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Error => tracing::error!("{}", n.message),
            Severity::Info | Severity::Success => {
                tracing::info!(severity = n.severity.as_str(), "{}", n.message)
            }
        }
    }
}

/// Keeps every notification; used by tests and non-interactive callers.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        match self.seen.lock() {
            Ok(mut seen) => std::mem::take(&mut *seen),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        match self.seen.lock() {
            Ok(seen) => seen.iter().filter(|n| n.severity == severity).count(),
            Err(poisoned) => poisoned
                .into_inner()
                .iter()
                .filter(|n| n.severity == severity)
                .count(),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        match self.seen.lock() {
            Ok(mut seen) => seen.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackers_core::{FetchError, PersistenceError};

    #[test]
    fn errors_stay_longer_than_success() {
        assert!(Notification::error("x").duration > Notification::success("x").duration);
    }

    #[test]
    fn fetch_failures_are_errors_and_write_failures_are_warnings() {
        let fetch: TrackerError = FetchError::network("tracking lookup", "timed out").into();
        assert_eq!(Notification::from(&fetch).severity, Severity::Error);

        let write: TrackerError = PersistenceError::Write {
            key: "shipments".into(),
            message: "quota exceeded".into(),
        }
        .into();
        let note = Notification::from(&write);
        assert_eq!(note.severity, Severity::Info);
        assert!(note.message.contains("quota exceeded"));
    }

    #[test]
    fn recorder_collects_in_order() {
        let rec = RecordingNotifier::new();
        rec.notify(Notification::info("a"));
        rec.notify(Notification::error("b"));
        assert_eq!(rec.count(Severity::Error), 1);
        let seen: Vec<_> = rec.take().into_iter().map(|n| n.message).collect();
        assert_eq!(seen, ["a", "b"]);
        assert!(rec.take().is_empty());
    }
}
