//! Git driver implementation.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use keel_core::{Driver, Result, VcsError};
use tracing::{debug, error, info, warn};

use crate::attributes::{CheckAttrOutput, LINGUIST_GENERATED};
use crate::auth::{authenticated_url, redact_url};
use crate::command::{CommandRunner, GitCommand, PipedOutput, SystemRunner};
use crate::config::GitDriverConfig;
use crate::detect::{HeadBranchDetector, RefDetector};

/// Name the driver is registered under.
pub const DRIVER_NAME: &str = "git";

/// Ref used when none is configured and none could be detected.
pub const DEFAULT_REF: &str = "master";

const SPECIAL_FILES: &[&str] = &[".git"];

/// A driver that manages one working copy through the `git` program.
///
/// Clone and the head-revision query are strict: their failures are returned.
/// Fetch, reset, ref detection and attribute queries are best-effort: failures
/// are logged and the operation carries on, leaving the next scheduled pull
/// to retry.
pub struct GitDriver {
    config: GitDriverConfig,
    runner: Arc<dyn CommandRunner>,
    ref_detector: Arc<dyn RefDetector>,
}

impl GitDriver {
    /// Creates a driver running the system `git` with head-branch detection.
    ///
    /// An unset (zero) pull depth is replaced by the default depth of 1.
    pub fn new(config: GitDriverConfig) -> Self {
        let config = config.with_default_depth();
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let ref_detector = Self::default_detector(&config, &runner);

        Self {
            config,
            runner,
            ref_detector,
        }
    }

    /// Creates a driver from optional raw JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::Config` for malformed configuration.
    pub fn from_config(bytes: Option<&[u8]>) -> Result<Self> {
        Ok(Self::new(GitDriverConfig::from_slice(bytes)?))
    }

    /// Replaces the command runner.
    ///
    /// The ref detector is reset to a head-branch detector using `runner`;
    /// call [`with_ref_detector`](Self::with_ref_detector) afterwards to
    /// override it.
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.ref_detector = Self::default_detector(&self.config, &runner);
        self.runner = runner;
        self
    }

    /// Replaces the ref detector.
    pub fn with_ref_detector(mut self, ref_detector: Arc<dyn RefDetector>) -> Self {
        self.ref_detector = ref_detector;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GitDriverConfig {
        &self.config
    }

    fn default_detector(
        config: &GitDriverConfig,
        runner: &Arc<dyn CommandRunner>,
    ) -> Arc<dyn RefDetector> {
        Arc::new(
            HeadBranchDetector::new(Arc::clone(runner)).with_timeout(config.command_timeout()),
        )
    }

    /// Resolves the ref to synchronize `dir` to.
    ///
    /// An explicit ref always wins. Otherwise, if detection is enabled and
    /// yields a non-empty name, that is used. Otherwise [`DEFAULT_REF`].
    pub async fn target_ref(&self, dir: &Path) -> String {
        if let Some(explicit) = self.config.explicit_ref() {
            return explicit.to_string();
        }

        if self.config.detect_ref()
            && let Some(detected) = self.ref_detector.detect_ref(dir).await
            && !detected.is_empty()
        {
            return detected;
        }

        DEFAULT_REF.to_string()
    }

    fn depth_args(&self) -> Vec<String> {
        let depth = self.config.pull_depth();
        if depth > 0 {
            vec!["--depth".to_string(), depth.to_string()]
        } else {
            Vec::new()
        }
    }

    fn command<I, S>(&self, dir: &Path, args: I) -> GitCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GitCommand::new(dir, args).with_timeout(self.config.command_timeout())
    }

    /// Runs `command`, logging any failure instead of returning it.
    ///
    /// Always yields the combined output captured so far, which is empty if
    /// the process never ran.
    async fn run_tolerant(&self, description: &str, command: GitCommand) -> String {
        match self.runner.run(&command).await {
            Ok(output) => {
                let text = output.combined();
                if !output.success {
                    warn!(
                        "Failed to {} `{}` at {:?}, see output below\n{}: {}\nContinuing...",
                        description,
                        command,
                        command.dir(),
                        text.trim_end(),
                        output.status()
                    );
                }
                text
            },
            Err(e) => {
                warn!(
                    "Failed to {} `{}` at {:?}: {}\nContinuing...",
                    description,
                    command,
                    command.dir(),
                    e
                );
                String::new()
            },
        }
    }
}

/// Splits a working-copy path into the directory to run `git clone` in and
/// the name of the directory to clone into.
fn split_repo_dir(dir: &Path) -> Result<(&Path, String)> {
    let leaf = dir
        .file_name()
        .ok_or_else(|| VcsError::invalid_path(dir, "path has no final component"))?
        .to_str()
        .ok_or_else(|| VcsError::invalid_path(dir, "directory name is not valid UTF-8"))?
        .to_string();

    let parent = dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    Ok((parent, leaf))
}

#[async_trait]
impl Driver for GitDriver {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    async fn clone_repo(&self, dir: &Path, url: &str) -> Result<String> {
        let (parent, leaf) = split_repo_dir(dir)?;
        let remote = authenticated_url(url, self.config.username(), self.config.password())?;

        let mut args = vec!["clone".to_string()];
        args.extend(self.depth_args());
        args.push(remote);
        args.push(leaf);
        let command = self.command(parent, args);

        info!("Cloning {} into {:?}", redact_url(url), dir);

        let result = match self.runner.run(&command).await {
            Ok(output) => output.into_result(&command),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!("Failed to clone {}, see error below\n{}", redact_url(url), e);
            return Err(e);
        }

        self.pull(dir).await
    }

    async fn pull(&self, dir: &Path) -> Result<String> {
        let target = self.target_ref(dir).await;
        debug!("Pulling {} in {:?}", target, dir);

        let mut fetch = vec![
            "fetch".to_string(),
            "--prune".to_string(),
            "--no-tags".to_string(),
        ];
        fetch.extend(self.depth_args());
        fetch.push("origin".to_string());
        fetch.push(format!("+{target}:remotes/origin/{target}"));
        self.run_tolerant("git fetch", self.command(dir, fetch)).await;

        let reset = ["reset".to_string(), "--hard".to_string(), format!("origin/{target}")];
        self.run_tolerant("git reset", self.command(dir, reset)).await;

        self.head_rev(dir).await
    }

    async fn head_rev(&self, dir: &Path) -> Result<String> {
        let command = self.command(dir, ["rev-parse", "HEAD"]);

        let result = match self.runner.run(&command).await {
            Ok(output) => output.into_result(&command),
            Err(e) => Err(e),
        };

        match result {
            Ok(output) => Ok(output.stdout_lossy().trim().to_string()),
            Err(e) => {
                warn!("Failed to read head revision in {:?}: {}", dir, e);
                Err(e)
            },
        }
    }

    fn special_files(&self) -> &[&str] {
        SPECIAL_FILES
    }

    async fn auto_generated_files(&self, dir: &Path) -> Vec<String> {
        let list = self.command(dir, ["ls-files", "-z"]);
        let check = self.command(dir, ["check-attr", "--stdin", "-z", LINGUIST_GENERATED]);

        let piped = self.runner.run_piped(&list, &check).await;
        let PipedOutput { producer, consumer } = match piped {
            Ok(piped) => piped,
            Err(e) => {
                warn!("Error occurred when listing attributes in {:?}: {}", dir, e);
                return Vec::new();
            },
        };

        let checked = match consumer.into_result(&check) {
            Ok(output) => output,
            Err(e) => {
                warn!("Error occurred when running git check-attr in {:?}: {}", dir, e);
                return Vec::new();
            },
        };

        let parsed = CheckAttrOutput::parse(&checked.stdout);
        if !parsed.is_aligned() {
            warn!(
                "Ignoring {} trailing field(s) of git check-attr output in {:?}",
                parsed.trailing().len(),
                dir
            );
        }
        let files = parsed.paths_set_true(LINGUIST_GENERATED);

        if let Err(e) = producer.into_result(&list) {
            warn!("Error occurred when running git ls-files in {:?}: {}", dir, e);
        }

        files
    }
}

impl std::fmt::Debug for GitDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitDriver")
            .field("config", &self.config)
            .finish()
    }
}
