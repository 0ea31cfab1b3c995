//! Synchronization configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::SyncError;
use crate::syncer::SyncSchedule;

const ENV_PREFIX: &str = "KEEL";

/// Top-level configuration for `keel-sync`.
///
/// ```json
/// {
///   "data_dir": "/var/lib/keel",
///   "poll_interval_secs": 30,
///   "repos": {
///     "app": {
///       "url": "https://example.com/app.git",
///       "vcs_config": { "detect-ref": true }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Directory under which every repository is materialized.
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,

    /// Default interval between syncs.
    #[serde(default = "default_poll_interval")]
    poll_interval_secs: u64,

    /// Consecutive failures tolerated before backing off.
    #[serde(default = "default_max_failures")]
    max_failures: u32,

    /// Upper bound for the backed-off interval.
    #[serde(default = "default_max_backoff")]
    max_backoff_secs: u64,

    /// Repositories by name.
    #[serde(default)]
    repos: BTreeMap<String, RepoConfig>,
}

/// One managed repository.
#[derive(Clone, Deserialize)]
pub struct RepoConfig {
    /// Remote URL.
    url: String,

    /// Driver kind.
    #[serde(default = "default_vcs")]
    vcs: String,

    /// Driver configuration, handed to the driver as raw JSON.
    #[serde(default)]
    vcs_config: Option<serde_json::Value>,

    /// Per-repository override of the poll interval.
    #[serde(default)]
    poll_interval_secs: Option<u64>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_poll_interval() -> u64 {
    30
}

fn default_max_failures() -> u32 {
    3
}

fn default_max_backoff() -> u64 {
    300
}

fn default_vcs() -> String {
    "git".to_string()
}

impl SyncConfig {
    /// Loads a JSON configuration file, then applies `KEEL_*` environment
    /// overrides (for example `KEEL_DATA_DIR`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Json))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(json, config::FileFormat::Json))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks repository names, URLs and intervals.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.repos.is_empty() {
            return Err(SyncError::invalid("no repositories configured"));
        }
        if self.poll_interval_secs == 0 {
            return Err(SyncError::invalid("poll_interval_secs must be positive"));
        }

        for (name, repo) in &self.repos {
            validate_repo_name(name)?;
            if repo.url.trim().is_empty() {
                return Err(SyncError::invalid(format!("repository '{}' has no url", name)));
            }
            if repo.poll_interval_secs == Some(0) {
                return Err(SyncError::invalid(format!(
                    "repository '{}' has a zero poll interval",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Returns the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the repositories, ordered by name.
    pub fn repos(&self) -> impl Iterator<Item = (&str, &RepoConfig)> {
        self.repos.iter().map(|(name, repo)| (name.as_str(), repo))
    }

    /// Returns the working-copy directory for repository `name`.
    pub fn repo_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("vcs-{}", name))
    }

    /// Returns the sync schedule for `repo`.
    pub fn schedule_for(&self, repo: &RepoConfig) -> SyncSchedule {
        SyncSchedule {
            interval: Duration::from_secs(repo.poll_interval_secs.unwrap_or(self.poll_interval_secs)),
            max_failures: self.max_failures,
            max_backoff: Duration::from_secs(self.max_backoff_secs),
            ..SyncSchedule::default()
        }
    }
}

fn validate_repo_name(name: &str) -> Result<(), SyncError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(SyncError::invalid(format!("invalid repository name {:?}", name)));
    }
    if name.contains(['/', '\\']) {
        return Err(SyncError::invalid(format!(
            "repository name {:?} must not contain path separators",
            name
        )));
    }
    Ok(())
}

impl RepoConfig {
    /// Returns the remote URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the driver kind.
    pub fn vcs(&self) -> &str {
        &self.vcs
    }

    /// Returns the driver configuration as raw JSON bytes, if any.
    pub fn vcs_config_bytes(&self) -> Result<Option<Vec<u8>>, serde_json::Error> {
        self.vcs_config.as_ref().map(serde_json::to_vec).transpose()
    }
}

impl fmt::Debug for RepoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // vcs_config may hold credentials.
        f.debug_struct("RepoConfig")
            .field("url", &self.url)
            .field("vcs", &self.vcs)
            .field("vcs_config", &self.vcs_config.as_ref().map(|_| ".."))
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}
