use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::effects::Locations;

pub const APP_DIR_ENV: &str = "PRESFIX_APP_DIR";
pub const JSON_ENV: &str = "PRESFIX_JSON";
pub const LOG_ENV: &str = "PRESFIX_LOG";

const APP_BUNDLE_ID: &str = "com.prezi.desktop";

#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Name the user invoked the tool with, echoed in restore guidance.
    pub program: String,
}

#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    #[must_use]
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }

    pub(crate) fn flag_is_enabled(&self, key: &str) -> bool {
        matches!(self.vars.get(key).map(String::as_str), Some("1"))
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

#[derive(Debug)]
pub struct Config {
    pub(crate) app_root: PathBuf,
    pub(crate) output: OutputConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub json: bool,
}

impl Config {
    /// Builds a configuration snapshot from environment variables.
    ///
    /// # Errors
    /// Returns an error if no application directory override is set and the
    /// home directory cannot be determined.
    pub fn from_snapshot(snapshot: &EnvSnapshot, locations: &dyn Locations) -> Result<Self> {
        let app_root = match snapshot.var(APP_DIR_ENV).filter(|value| !value.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => locations
                .home_dir()
                .ok_or_else(|| anyhow!("unable to determine the home directory"))?
                .join("Library")
                .join("Application Support")
                .join(APP_BUNDLE_ID),
        };
        Ok(Self {
            app_root,
            output: OutputConfig {
                json: snapshot.flag_is_enabled(JSON_ENV),
            },
        })
    }

    #[must_use]
    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    #[must_use]
    pub fn output(&self) -> OutputConfig {
        self.output
    }
}
