use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

pub trait Platform: Send + Sync {
    /// Operating system family, as reported by `std::env::consts::OS`.
    fn os_family(&self) -> &str;
    /// Marketing version of the running OS, e.g. `12.6.1`.
    fn product_version(&self) -> Result<String>;
}

pub trait Locations: Send + Sync {
    fn home_dir(&self) -> Option<PathBuf>;
}

pub trait Effects: Send + Sync {
    fn platform(&self) -> &dyn Platform;
    fn locations(&self) -> &dyn Locations;
}

pub type SharedEffects = Arc<dyn Effects>;

pub struct SystemEffects {
    platform: Arc<SystemPlatform>,
    locations: Arc<SystemLocations>,
}

impl SystemEffects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            platform: Arc::new(SystemPlatform),
            locations: Arc::new(SystemLocations),
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects for SystemEffects {
    fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    fn locations(&self) -> &dyn Locations {
        self.locations.as_ref()
    }
}

struct SystemPlatform;

impl Platform for SystemPlatform {
    fn os_family(&self) -> &str {
        std::env::consts::OS
    }

    fn product_version(&self) -> Result<String> {
        let output = Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .context("failed to run sw_vers")?;
        if !output.status.success() {
            bail!("sw_vers exited with {}", output.status);
        }
        let version = String::from_utf8(output.stdout).context("sw_vers printed non-UTF-8")?;
        Ok(version.trim().to_string())
    }
}

struct SystemLocations;

impl Locations for SystemLocations {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs_next::home_dir()
    }
}
