use std::path::Path;

use async_trait::async_trait;
use keel_core::{Driver, DriverRegistry, Result, VcsError};

#[derive(Debug, Default)]
struct EchoDriver {
    revision: String,
}

#[async_trait]
impl Driver for EchoDriver {
    fn name(&self) -> &str {
        "echo"
    }

    async fn clone_repo(&self, dir: &Path, _url: &str) -> Result<String> {
        self.pull(dir).await
    }

    async fn pull(&self, dir: &Path) -> Result<String> {
        self.head_rev(dir).await
    }

    async fn head_rev(&self, _dir: &Path) -> Result<String> {
        Ok(self.revision.clone())
    }

    fn special_files(&self) -> &[&str] {
        &[".echo"]
    }

    async fn auto_generated_files(&self, _dir: &Path) -> Vec<String> {
        Vec::new()
    }
}

fn new_echo(config: Option<&[u8]>) -> Result<Box<dyn Driver>> {
    let revision = match config {
        Some(bytes) => {
            serde_json::from_slice::<String>(bytes).map_err(|e| VcsError::config("echo", e))?
        },
        None => "0000000".to_string(),
    };
    Ok(Box::new(EchoDriver { revision }))
}

fn new_other(_config: Option<&[u8]>) -> Result<Box<dyn Driver>> {
    Ok(Box::new(EchoDriver {
        revision: "other".to_string(),
    }))
}

#[tokio::test]
async fn creates_registered_driver_without_config() {
    let mut registry = DriverRegistry::new();
    registry.register("echo", new_echo);

    let driver = registry.create("echo", None).unwrap();
    assert_eq!(driver.name(), "echo");
    assert_eq!(driver.head_rev(Path::new(".")).await.unwrap(), "0000000");
}

#[tokio::test]
async fn passes_config_bytes_to_factory() {
    let mut registry = DriverRegistry::new();
    registry.register("echo", new_echo);

    let driver = registry.create("echo", Some(br#""feedface""#)).unwrap();
    assert_eq!(driver.head_rev(Path::new(".")).await.unwrap(), "feedface");
}

#[test]
fn malformed_config_is_a_config_error() {
    let mut registry = DriverRegistry::new();
    registry.register("echo", new_echo);

    let err = registry.create("echo", Some(b"{not json")).err().unwrap();
    assert!(err.is_config_error());
}

#[test]
fn unknown_driver_is_rejected() {
    let registry = DriverRegistry::new();

    let err = registry.create("hg", None).err().unwrap();
    assert!(matches!(err, VcsError::UnknownDriver(ref name) if name == "hg"));
}

#[tokio::test]
async fn later_registration_replaces_earlier() {
    let mut registry = DriverRegistry::new();
    registry.register("echo", new_echo).register("echo", new_other);

    assert_eq!(registry.names(), vec!["echo"]);
    let driver = registry.create("echo", None).unwrap();
    assert_eq!(driver.head_rev(Path::new(".")).await.unwrap(), "other");
}

#[test]
fn names_are_sorted() {
    let mut registry = DriverRegistry::new();
    registry.register("svn", new_other).register("git", new_echo);

    assert!(registry.contains("git"));
    assert!(!registry.contains("hg"));
    assert_eq!(registry.names(), vec!["git", "svn"]);
}
