//! Periodic repository synchronization.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use keel_core::{Driver, Result};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval, interval_at};
use tracing::{debug, info, warn};

use crate::state::RepoState;

/// Timing of the sync loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSchedule {
    /// Interval between syncs.
    pub interval: Duration,
    /// Consecutive failures tolerated before backing off.
    pub max_failures: u32,
    /// Backoff multiplier for failures.
    pub backoff_multiplier: f64,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for SyncSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_failures: 3,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(300),
        }
    }
}

/// Outcome of one successful sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Revision checked out after the sync.
    pub revision: String,
    /// Machine-generated paths in the working copy.
    pub auto_generated: Vec<String>,
    /// Driver metadata entries in the working copy.
    pub special_files: Vec<String>,
}

/// Handle for a running sync loop.
///
/// Dropping the handle stops the loop.
pub struct SyncHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Signals the loop to stop after the current cycle.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!("Sync task ended abnormally: {}", e);
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Keeps one working copy in step with its remote.
pub struct RepoSyncer {
    name: String,
    url: String,
    dir: PathBuf,
    driver: Arc<dyn Driver>,
    state: Arc<RepoState>,
    schedule: SyncSchedule,
    current_backoff: Mutex<Duration>,
}

impl RepoSyncer {
    /// Creates a syncer materializing `url` at `dir` with `driver`.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        dir: impl Into<PathBuf>,
        driver: Arc<dyn Driver>,
        schedule: SyncSchedule,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            dir: dir.into(),
            driver,
            state: Arc::new(RepoState::new()),
            current_backoff: Mutex::new(schedule.interval),
            schedule,
        }
    }

    /// Returns the repository name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the working-copy directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the sync schedule.
    pub fn schedule(&self) -> &SyncSchedule {
        &self.schedule
    }

    /// Returns the shared sync state.
    pub fn state(&self) -> Arc<RepoState> {
        Arc::clone(&self.state)
    }

    /// Returns the interval until the next sync, including backoff.
    pub fn current_interval(&self) -> Duration {
        *self.current_backoff.lock()
    }

    /// Starts the background sync loop. The first sync runs immediately.
    pub fn start(self) -> SyncHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));

        SyncHandle {
            shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut timer = interval(self.schedule.interval);

        info!(
            "Starting sync of {} into {:?} every {:?}",
            self.name, self.dir, self.schedule.interval
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let _ = self.sync_once().await;

                    let current = self.current_interval();
                    if current != timer.period() {
                        timer = interval_at(Instant::now() + current, current);
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Sync of {} shutting down", self.name);
                        break;
                    }
                }
            }
        }
    }

    /// Runs one sync cycle: clone when the working copy is missing, pull
    /// otherwise, then collect repository metadata.
    pub async fn sync_once(&self) -> Result<SyncReport> {
        debug!("Syncing {}", self.name);

        let result = self.sync_repository().await;
        match &result {
            Ok(report) => {
                self.state.record_success(&report.revision);
                self.state.set_auto_generated(report.auto_generated.clone());
                self.reset_backoff();
                info!(
                    "Synced {} at {} ({} generated files)",
                    self.name,
                    report.revision,
                    report.auto_generated.len()
                );
            },
            Err(e) => {
                self.state.record_failure(e.to_string());
                self.increase_backoff();
                warn!("Sync of {} failed: {}", self.name, e);
            },
        }

        result
    }

    async fn sync_repository(&self) -> Result<SyncReport> {
        let revision = if tokio::fs::try_exists(&self.dir).await? {
            self.driver.pull(&self.dir).await?
        } else {
            self.initial_clone().await?
        };

        let auto_generated = self.driver.auto_generated_files(&self.dir).await;
        let special_files = self
            .driver
            .special_files()
            .iter()
            .map(|f| f.to_string())
            .collect();

        Ok(SyncReport {
            revision,
            auto_generated,
            special_files,
        })
    }

    async fn initial_clone(&self) -> Result<String> {
        if let Some(parent) = self.dir.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let result = self.driver.clone_repo(&self.dir, &self.url).await;

        // The next cycle must clone again, not pull a partial working copy.
        if result.is_err()
            && tokio::fs::try_exists(&self.dir).await.unwrap_or(false)
            && let Err(e) = tokio::fs::remove_dir_all(&self.dir).await
        {
            warn!("Failed to remove incomplete clone at {:?}: {}", self.dir, e);
        }

        result
    }

    fn reset_backoff(&self) {
        *self.current_backoff.lock() = self.schedule.interval;
    }

    fn increase_backoff(&self) {
        let mut backoff = self.current_backoff.lock();
        let failure_count = self.state.failure_count();

        if failure_count >= self.schedule.max_failures {
            let next =
                Duration::from_secs_f64(backoff.as_secs_f64() * self.schedule.backoff_multiplier);
            *backoff = next.min(self.schedule.max_backoff);

            debug!(
                "Increased backoff of {} to {:?} after {} failures",
                self.name, *backoff, failure_count
            );
        }
    }
}

impl std::fmt::Debug for RepoSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoSyncer")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("driver", &self.driver.name())
            .field("schedule", &self.schedule)
            .finish()
    }
}
