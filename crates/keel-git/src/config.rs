//! Git driver configuration.

use std::fmt;
use std::time::Duration;

use keel_core::VcsError;
use serde::{Deserialize, Serialize};

/// Shallow depth applied when the configuration leaves `pull-depth` unset.
pub const DEFAULT_PULL_DEPTH: i64 = 1;

/// Configuration for a [`GitDriver`](crate::GitDriver).
///
/// Deserialized from the raw JSON handed to the driver registry. All keys are
/// optional and unknown keys are ignored:
///
/// ```json
/// {
///   "detect-ref": false,
///   "ref": "",
///   "username": "",
///   "password": "",
///   "pull-depth": 0,
///   "command-timeout": 120
/// }
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitDriverConfig {
    /// Whether to ask the remote for its default branch when no ref is given.
    #[serde(default)]
    detect_ref: bool,

    /// Explicit branch, tag or commit-ish. Empty means not specified.
    #[serde(default, rename = "ref")]
    git_ref: String,

    /// Basic-auth username for http(s) remotes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    username: String,

    /// Basic-auth password or token for http(s) remotes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    password: String,

    /// Shallow clone/fetch depth. Zero is replaced by the default when the
    /// driver is built; negative values disable depth limiting.
    #[serde(default)]
    pull_depth: i64,

    /// Deadline in seconds for every git invocation (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command_timeout: Option<u64>,
}

impl GitDriverConfig {
    /// Creates a new builder for GitDriverConfig.
    pub fn builder() -> GitDriverConfigBuilder {
        GitDriverConfigBuilder::default()
    }

    /// Deserializes the configuration from optional raw JSON bytes.
    ///
    /// `None` yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `VcsError::Config` if the bytes are not a valid configuration.
    pub fn from_slice(bytes: Option<&[u8]>) -> Result<Self, VcsError> {
        match bytes {
            Some(bytes) => serde_json::from_slice(bytes).map_err(|e| VcsError::config("git", e)),
            None => Ok(Self::default()),
        }
    }

    /// Returns whether ref detection is enabled.
    pub fn detect_ref(&self) -> bool {
        self.detect_ref
    }

    /// Returns the configured ref, empty when not specified.
    pub fn git_ref(&self) -> &str {
        &self.git_ref
    }

    /// Returns the configured ref if one was given.
    pub fn explicit_ref(&self) -> Option<&str> {
        Some(self.git_ref.as_str()).filter(|r| !r.is_empty())
    }

    /// Returns the username for authentication.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password/token for authentication.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns true if either a username or a password is set.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }

    /// Returns the shallow depth.
    pub fn pull_depth(&self) -> i64 {
        self.pull_depth
    }

    /// Returns the per-command deadline.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout.map(Duration::from_secs)
    }

    /// Replaces an unset (zero) pull depth with [`DEFAULT_PULL_DEPTH`].
    pub(crate) fn with_default_depth(mut self) -> Self {
        if self.pull_depth == 0 {
            self.pull_depth = DEFAULT_PULL_DEPTH;
        }
        self
    }
}

impl fmt::Debug for GitDriverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("GitDriverConfig")
            .field("detect_ref", &self.detect_ref)
            .field("git_ref", &self.git_ref)
            .field("username", &self.username)
            .field("password", &password)
            .field("pull_depth", &self.pull_depth)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

/// Builder for GitDriverConfig.
#[derive(Debug, Default)]
pub struct GitDriverConfigBuilder {
    config: GitDriverConfig,
}

impl GitDriverConfigBuilder {
    /// Sets whether to detect the remote's default branch.
    pub fn detect_ref(mut self, detect: bool) -> Self {
        self.config.detect_ref = detect;
        self
    }

    /// Sets the explicit ref.
    pub fn git_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.config.git_ref = git_ref.into();
        self
    }

    /// Sets basic authentication credentials.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = username.into();
        self.config.password = password.into();
        self
    }

    /// Sets the shallow depth.
    pub fn pull_depth(mut self, depth: i64) -> Self {
        self.config.pull_depth = depth;
        self
    }

    /// Sets the per-command deadline, rounded down to whole seconds.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = Some(timeout.as_secs());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> GitDriverConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let cfg = br#"{"username" : "git_user", "password" : "git_pass"}"#;
        let config = GitDriverConfig::from_slice(Some(cfg)).unwrap();

        assert_eq!(config.username(), "git_user");
        assert_eq!(config.password(), "git_pass");
        assert!(config.has_credentials());
        assert_eq!(config.pull_depth(), 0);
        assert_eq!(config.with_default_depth().pull_depth(), 1);
    }

    #[test]
    fn test_parse_all_keys() {
        let cfg = br#"{
            "detect-ref": true,
            "ref": "release",
            "pull-depth": 5,
            "command-timeout": 90,
            "unrelated": "ignored"
        }"#;
        let config = GitDriverConfig::from_slice(Some(cfg)).unwrap();

        assert!(config.detect_ref());
        assert_eq!(config.explicit_ref(), Some("release"));
        assert_eq!(config.pull_depth(), 5);
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(90)));
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_absent_config_is_default() {
        let config = GitDriverConfig::from_slice(None).unwrap();

        assert!(!config.detect_ref());
        assert_eq!(config.git_ref(), "");
        assert_eq!(config.explicit_ref(), None);
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_malformed_config() {
        let err = GitDriverConfig::from_slice(Some(b"{\"pull-depth\": \"deep\"}")).unwrap_err();
        assert!(err.is_config_error());

        let err = GitDriverConfig::from_slice(Some(b"")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_default_depth_keeps_explicit_values() {
        let config = GitDriverConfig::builder().pull_depth(-1).build();
        assert_eq!(config.with_default_depth().pull_depth(), -1);

        let config = GitDriverConfig::builder().pull_depth(20).build();
        assert_eq!(config.with_default_depth().pull_depth(), 20);
    }

    #[test]
    fn test_builder() {
        let config = GitDriverConfig::builder()
            .detect_ref(true)
            .git_ref("develop")
            .basic_auth("user", "token")
            .pull_depth(3)
            .command_timeout(Duration::from_millis(2500))
            .build();

        assert!(config.detect_ref());
        assert_eq!(config.git_ref(), "develop");
        assert_eq!(config.username(), "user");
        assert_eq!(config.password(), "token");
        assert_eq!(config.pull_depth(), 3);
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_debug_masks_password() {
        let config = GitDriverConfig::builder()
            .basic_auth("user", "s3cret")
            .build();
        let rendered = format!("{:?}", config);

        assert!(rendered.contains("user"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_serialize_skips_empty_credentials() {
        let config = GitDriverConfig::builder().git_ref("main").build();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["ref"], "main");
        assert!(json.get("username").is_none());
        assert!(json.get("command-timeout").is_none());
    }
}
