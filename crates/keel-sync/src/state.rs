//! Repository synchronization state tracking.

use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Tracks the outcome of sync cycles for one repository.
#[derive(Debug, Default)]
pub struct RepoState {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// The current revision of the working copy.
    revision: Option<String>,
    /// The last successful sync time.
    last_sync: Option<Instant>,
    /// The last error message, if any.
    last_error: Option<String>,
    /// Number of consecutive failures.
    failure_count: u32,
    /// Paths reported as machine-generated by the last successful sync.
    auto_generated: Vec<String>,
}

impl RepoState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current revision.
    pub fn revision(&self) -> Option<String> {
        self.inner.read().revision.clone()
    }

    /// Returns the time of the last successful sync.
    pub fn last_sync(&self) -> Option<Instant> {
        self.inner.read().last_sync
    }

    /// Returns the duration since the last successful sync.
    pub fn time_since_sync(&self) -> Option<Duration> {
        self.inner.read().last_sync.map(|t| t.elapsed())
    }

    /// Records a successful sync at `revision`.
    pub fn record_success(&self, revision: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.revision = Some(revision.into());
        inner.last_sync = Some(Instant::now());
        inner.last_error = None;
        inner.failure_count = 0;
    }

    /// Records a failed sync. The previous revision is kept.
    pub fn record_failure(&self, error: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.last_error = Some(error.into());
        inner.failure_count += 1;
    }

    /// Replaces the list of machine-generated paths.
    pub fn set_auto_generated(&self, files: Vec<String>) {
        self.inner.write().auto_generated = files;
    }

    /// Returns the machine-generated paths from the last successful sync.
    pub fn auto_generated(&self) -> Vec<String> {
        self.inner.read().auto_generated.clone()
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    /// Returns the number of consecutive failures.
    pub fn failure_count(&self) -> u32 {
        self.inner.read().failure_count
    }

    /// Returns true once a sync has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.inner.read().revision.is_some()
    }

    /// Returns true if the last sync succeeded.
    pub fn is_healthy(&self) -> bool {
        let inner = self.inner.read();
        inner.revision.is_some() && inner.last_error.is_none()
    }

    /// Returns true if a sync is due for the given interval.
    pub fn needs_sync(&self, interval: Duration) -> bool {
        match self.time_since_sync() {
            Some(elapsed) => elapsed >= interval,
            None => true,
        }
    }
}
