//! Version-control driver trait definition.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// A version-control backend able to materialize and refresh a working copy.
///
/// One driver instance manages one repository. It owns no shared mutable
/// state, so callers that manage a single working directory from several
/// tasks must serialize `clone_repo`/`pull` themselves.
///
/// # Implementors
///
/// - `GitDriver` (in `keel-git`) - shells out to the system `git` program
///
/// # Example
///
/// ```ignore
/// use keel_core::{Driver, DriverRegistry};
///
/// let driver = registry.create("git", Some(br#"{"ref": "main"}"#))?;
/// let rev = driver.clone_repo(Path::new("/srv/repos/app"), "https://example.com/app.git").await?;
/// let rev = driver.pull(Path::new("/srv/repos/app")).await?;
/// ```
#[async_trait]
pub trait Driver: Send + Sync {
    /// Returns the driver kind this instance was registered under.
    fn name(&self) -> &str;

    /// Clones `url` into `dir` and brings it to the target revision.
    ///
    /// `dir` must not exist yet; its parent must. Returns the head revision.
    ///
    /// # Errors
    ///
    /// Fails when credentials cannot be applied to `url` or when the clone
    /// command itself fails. Later synchronization steps are best-effort.
    async fn clone_repo(&self, dir: &Path, url: &str) -> Result<String>;

    /// Synchronizes an existing working copy and returns its head revision.
    ///
    /// # Errors
    ///
    /// Only the final head-revision query surfaces an error; intermediate
    /// steps are logged and tolerated.
    async fn pull(&self, dir: &Path) -> Result<String>;

    /// Returns the revision currently checked out in `dir`.
    async fn head_rev(&self, dir: &Path) -> Result<String>;

    /// Returns the names of version-control internals to exclude from scanning.
    fn special_files(&self) -> &[&str];

    /// Returns tracked paths marked as machine-generated.
    ///
    /// Best-effort: failures are logged and yield a partial or empty list.
    async fn auto_generated_files(&self, dir: &Path) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticDriver {
        rev: String,
    }

    #[async_trait]
    impl Driver for StaticDriver {
        fn name(&self) -> &str {
            "static"
        }

        async fn clone_repo(&self, dir: &Path, _url: &str) -> Result<String> {
            self.pull(dir).await
        }

        async fn pull(&self, dir: &Path) -> Result<String> {
            self.head_rev(dir).await
        }

        async fn head_rev(&self, _dir: &Path) -> Result<String> {
            Ok(self.rev.clone())
        }

        fn special_files(&self) -> &[&str] {
            &[".static"]
        }

        async fn auto_generated_files(&self, _dir: &Path) -> Vec<String> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_driver_is_object_safe() {
        let driver: Box<dyn Driver> = Box::new(StaticDriver {
            rev: "abc123".to_string(),
        });

        let rev = driver
            .clone_repo(Path::new("/tmp/repo"), "https://example.com/repo.git")
            .await
            .unwrap();

        assert_eq!(rev, "abc123");
        assert_eq!(driver.special_files(), &[".static"]);
        assert!(
            driver
                .auto_generated_files(Path::new("/tmp/repo"))
                .await
                .is_empty()
        );
    }
}
