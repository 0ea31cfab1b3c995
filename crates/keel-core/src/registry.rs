//! Driver registry: maps a driver kind to its constructor.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::driver::Driver;
use crate::error::{Result, VcsError};

/// Builds a driver from optional raw configuration bytes.
pub type DriverFactory = fn(Option<&[u8]>) -> Result<Box<dyn Driver>>;

/// Registry of available driver kinds.
///
/// Backends register themselves explicitly at startup; there is no
/// process-wide registry.
#[derive(Default)]
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl DriverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any earlier registration.
    pub fn register(&mut self, name: impl Into<String>, factory: DriverFactory) -> &mut Self {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            debug!("Replaced driver factory for {}", name);
        }
        self
    }

    /// Returns true if a driver is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered driver kinds, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Constructs a driver of kind `name` from raw configuration bytes.
    ///
    /// # Errors
    ///
    /// - `VcsError::UnknownDriver` if nothing is registered under `name`
    /// - whatever the driver's factory returns, typically `VcsError::Config`
    pub fn create(&self, name: &str, config: Option<&[u8]>) -> Result<Box<dyn Driver>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| VcsError::unknown_driver(name))?;

        factory(config)
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}
