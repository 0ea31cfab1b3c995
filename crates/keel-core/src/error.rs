//! Error types for version-control drivers.
//!
//! Every driver operation that can fail returns `Result<T, VcsError>`.
//! Whether a failure is fatal or tolerated is decided by the call site:
//! drivers log and continue past best-effort steps, and only surface the
//! failures a caller depends on immediately.
//!
//! # Example
//!
//! ```
//! use keel_core::{Result, VcsError};
//!
//! fn check_name(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(VcsError::unknown_driver(name));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_name("").is_err());
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for driver construction and driver operations.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The raw driver configuration could not be deserialized.
    #[error("invalid {driver} driver configuration: {source}")]
    Config {
        /// Driver kind the configuration was meant for
        driver: String,
        /// Underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// No driver is registered under the requested name.
    #[error("unknown driver '{0}'")]
    UnknownDriver(String),

    /// Credentials were supplied for a remote that is not http(s).
    #[error("{url} is not an http or https repository, it cannot carry a username or password")]
    UnsupportedAuthScheme {
        /// The remote URL as given by the caller
        url: String,
    },

    /// The remote URL could not be parsed or rebuilt.
    #[error("invalid repository url '{url}': {reason}")]
    InvalidUrl {
        /// The remote URL as given by the caller
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A working-directory path cannot be used by the driver.
    #[error("invalid repository path {path:?}: {reason}")]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// An external program could not be launched.
    #[error("failed to launch `{command}` in {dir:?}: {source}")]
    Spawn {
        /// Rendered command line, credentials masked
        command: String,
        /// Working directory of the command
        dir: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An external program ran but exited unsuccessfully.
    #[error("`{command}` failed in {dir:?} ({status}): {output}")]
    CommandFailed {
        /// Rendered command line, credentials masked
        command: String,
        /// Working directory of the command
        dir: PathBuf,
        /// Exit status description
        status: String,
        /// Captured output, trimmed
        output: String,
    },

    /// An external program exceeded its deadline and was killed.
    #[error("`{command}` timed out after {seconds}s")]
    Timeout {
        /// Rendered command line, credentials masked
        command: String,
        /// Deadline that expired
        seconds: u64,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VcsError {
    /// Creates a Config error for the given driver kind.
    pub fn config(driver: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Config {
            driver: driver.into(),
            source,
        }
    }

    /// Creates an UnknownDriver error.
    pub fn unknown_driver(name: impl Into<String>) -> Self {
        Self::UnknownDriver(name.into())
    }

    /// Creates an UnsupportedAuthScheme error.
    pub fn unsupported_auth_scheme(url: impl Into<String>) -> Self {
        Self::UnsupportedAuthScheme { url: url.into() }
    }

    /// Creates an InvalidUrl error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an InvalidPath error.
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error comes from malformed driver configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this error was raised while preparing credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::UnsupportedAuthScheme { .. } | Self::InvalidUrl { .. })
    }

    /// Returns true if an external command failed, timed out or never started.
    pub fn is_command_error(&self) -> bool {
        matches!(
            self,
            Self::Spawn { .. } | Self::CommandFailed { .. } | Self::Timeout { .. }
        )
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        self.is_command_error()
    }
}

/// Type alias for Results with VcsError.
pub type Result<T> = std::result::Result<T, VcsError>;
