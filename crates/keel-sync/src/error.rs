//! Error types for repository synchronization.

use keel_core::VcsError;

/// Errors raised while setting up synchronization.
///
/// Failures of individual sync cycles are `VcsError`s and are recorded in
/// the repository's state rather than aborting the process.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The configuration file or environment could not be read.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The configuration was read but is not usable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A repository's driver configuration could not be encoded.
    #[error("invalid vcs_config for repository '{repo}': {source}")]
    VcsConfig {
        /// Repository name
        repo: String,
        /// Underlying encoding error
        #[source]
        source: serde_json::Error,
    },

    /// The driver for a repository could not be constructed.
    #[error("failed to create driver for repository '{repo}': {source}")]
    Driver {
        /// Repository name
        repo: String,
        /// Underlying driver error
        #[source]
        source: VcsError,
    },
}

impl SyncError {
    /// Creates an InvalidConfig error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
