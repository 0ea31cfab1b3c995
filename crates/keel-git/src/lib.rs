//! # Keel Git Driver
//!
//! Git backend for Keel: materializes a working copy of a remote repository,
//! keeps it synchronized and reports repository metadata.
//!
//! ## Features
//!
//! - All repository mutation via the system `git` CLI
//! - Shallow clone, then forced fetch into `remotes/origin/<ref>` plus hard reset
//! - Ref precedence: explicit ref, then the remote's `HEAD` branch (opt-in),
//!   then `master`
//! - Basic-auth credential embedding for http(s) remotes
//! - `linguist-generated` detection by streaming `git ls-files -z` into
//!   `git check-attr --stdin -z`
//!
//! ## Example
//!
//! ```ignore
//! use keel_core::{Driver, DriverRegistry};
//!
//! let mut registry = DriverRegistry::new();
//! keel_git::register(&mut registry);
//!
//! let driver = registry.create("git", Some(br#"{"detect-ref": true}"#))?;
//! let rev = driver.clone_repo(Path::new("/srv/repos/app"), "https://example.com/app.git").await?;
//! let generated = driver.auto_generated_files(Path::new("/srv/repos/app")).await;
//! ```

pub mod attributes;
pub mod auth;
pub mod command;
pub mod config;
pub mod detect;
pub mod driver;

#[cfg(test)]
mod testing;

use keel_core::{Driver, DriverRegistry, Result};

// Re-exports
pub use attributes::{AttributeRecord, CheckAttrOutput, LINGUIST_GENERATED};
pub use auth::{authenticated_url, redact_url};
pub use command::{CommandOutput, CommandRunner, GitCommand, PipedOutput, SystemRunner};
pub use config::{DEFAULT_PULL_DEPTH, GitDriverConfig, GitDriverConfigBuilder};
pub use detect::{HeadBranchDetector, NoDetection, RefDetector, parse_head_branch};
pub use driver::{DEFAULT_REF, DRIVER_NAME, GitDriver};

/// Registers the git driver under [`DRIVER_NAME`].
pub fn register(registry: &mut DriverRegistry) {
    registry.register(DRIVER_NAME, new_driver);
}

fn new_driver(config: Option<&[u8]>) -> Result<Box<dyn Driver>> {
    Ok(Box::new(GitDriver::from_config(config)?))
}
