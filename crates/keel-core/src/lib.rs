//! Keel Core - Driver contract and registry
//!
//! This crate provides the types shared by every version-control driver:
//! the [`Driver`] trait, the [`DriverRegistry`] used to construct drivers
//! from raw configuration, and the [`VcsError`] taxonomy.

pub mod driver;
pub mod error;
pub mod registry;

pub use driver::Driver;
pub use error::{Result, VcsError};
pub use registry::{DriverFactory, DriverRegistry};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        assert_eq!(v.split('.').count(), 3, "Version should be semver");
    }
}
