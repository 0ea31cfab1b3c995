//! # Keel Sync
//!
//! Keeps a set of named repositories materialized under a data directory and
//! periodically synchronized through their Keel drivers.
//!
//! Each repository gets its own [`RepoSyncer`]: the first cycle clones into
//! `<data_dir>/vcs-<name>`, later cycles pull. Failed cycles are recorded in
//! the repository's [`RepoState`] and back off the poll interval.

pub mod config;
pub mod error;
pub mod state;
pub mod syncer;

use std::sync::Arc;

use keel_core::DriverRegistry;

// Re-exports
pub use config::{RepoConfig, SyncConfig};
pub use error::SyncError;
pub use state::RepoState;
pub use syncer::{RepoSyncer, SyncHandle, SyncReport, SyncSchedule};

/// Returns a registry with every built-in driver.
pub fn default_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    keel_git::register(&mut registry);
    registry
}

/// Creates one syncer per configured repository, ordered by name.
///
/// # Errors
///
/// Fails on the first repository whose driver cannot be constructed.
pub fn build_syncers(
    config: &SyncConfig,
    registry: &DriverRegistry,
) -> Result<Vec<RepoSyncer>, SyncError> {
    config
        .repos()
        .map(|(name, repo)| -> Result<RepoSyncer, SyncError> {
            let vcs_config = repo.vcs_config_bytes().map_err(|source| SyncError::VcsConfig {
                repo: name.to_string(),
                source,
            })?;
            let driver = registry
                .create(repo.vcs(), vcs_config.as_deref())
                .map_err(|source| SyncError::Driver {
                    repo: name.to_string(),
                    source,
                })?;

            Ok(RepoSyncer::new(
                name,
                repo.url(),
                config.repo_dir(name),
                Arc::from(driver),
                config.schedule_for(repo),
            ))
        })
        .collect()
}
