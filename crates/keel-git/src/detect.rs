//! Target ref detection.
//!
//! When no explicit ref is configured the driver can ask the remote which
//! branch its `HEAD` points at. Detection never fails: anything that goes
//! wrong is logged and reported as "unknown" so the driver falls back to
//! [`DEFAULT_REF`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::command::{CommandRunner, GitCommand, SystemRunner};
use crate::driver::DEFAULT_REF;

const HEAD_BRANCH_MARKER: &str = "HEAD branch: ";

/// Produces a candidate ref for a working copy.
#[async_trait]
pub trait RefDetector: Send + Sync {
    /// Returns the detected ref, or `None` when it cannot be determined.
    async fn detect_ref(&self, dir: &Path) -> Option<String>;
}

/// Never detects anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDetection;

#[async_trait]
impl RefDetector for NoDetection {
    async fn detect_ref(&self, _dir: &Path) -> Option<String> {
        None
    }
}

/// Reads the remote's default branch from `git remote show origin`.
#[derive(Clone)]
pub struct HeadBranchDetector {
    runner: Arc<dyn CommandRunner>,
    timeout: Option<Duration>,
}

impl HeadBranchDetector {
    /// Creates a detector running git through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: None,
        }
    }

    /// Bounds the `git remote show` query by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HeadBranchDetector {
    fn default() -> Self {
        Self::new(Arc::new(SystemRunner))
    }
}

impl std::fmt::Debug for HeadBranchDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadBranchDetector")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl RefDetector for HeadBranchDetector {
    async fn detect_ref(&self, dir: &Path) -> Option<String> {
        let command =
            GitCommand::new(dir, ["remote", "show", "origin"]).with_timeout(self.timeout);

        let output = match self.runner.run(&command).await {
            Ok(output) if output.success => output.combined(),
            Ok(output) => {
                warn!(
                    "Failed to show remote info via {} in {:?} ({}), falling back to default ref {}\n{}",
                    command,
                    dir,
                    output.status(),
                    DEFAULT_REF,
                    output.combined().trim_end()
                );
                return None;
            },
            Err(e) => {
                warn!(
                    "Failed to show remote info in {:?}: {}. Falling back to default ref {}",
                    dir, e, DEFAULT_REF
                );
                return None;
            },
        };

        match parse_head_branch(&output) {
            Some(branch) => {
                debug!("Detected remote HEAD branch {:?} in {:?}", branch, dir);
                Some(branch.to_string())
            },
            None => {
                warn!(
                    "Could not determine target ref in {:?}, falling back to default ref {}",
                    dir, DEFAULT_REF
                );
                None
            },
        }
    }
}

/// Extracts the branch name from `git remote show` output.
///
/// Returns the rest of the first `HEAD branch: ` line that has at least one
/// character after the marker. Whitespace inside the captured name is kept.
pub fn parse_head_branch(output: &str) -> Option<&str> {
    output.match_indices(HEAD_BRANCH_MARKER).find_map(|(idx, _)| {
        let rest = &output[idx + HEAD_BRANCH_MARKER.len()..];
        let branch = rest.split('\n').next().unwrap_or_default();
        (!branch.is_empty()).then_some(branch)
    })
}
