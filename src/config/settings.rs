use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{BastionError, Result};

/// Global settings for kube-bastion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Login user on the target node
    pub ssh_user: String,

    /// Container image for the bastion pod; needs `sh` and `apk`
    pub image: String,

    /// How long the bastion pod stays alive before it completes on its own
    pub pod_lifetime_secs: u64,

    /// Status checks while waiting for the bastion pod to run
    pub poll_attempts: u32,

    /// Delay between status checks
    pub poll_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ssh_user: "gardener".to_string(),
            image: "alpine".to_string(),
            pod_lifetime_secs: 1200,
            poll_attempts: 15,
            poll_interval_secs: 2,
        }
    }
}

impl Settings {
    /// Get the path to the config file
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "kube-bastion").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load settings from the config file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| BastionError::Config("Cannot determine config directory".to_string()))?;

        Self::load_from(&path)
    }

    /// Load settings from `path`, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            BastionError::Config(format!("Failed to parse config file: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ssh_user.trim().is_empty() {
            return Err(BastionError::Config("ssh_user cannot be empty".to_string()));
        }
        if self.image.trim().is_empty() {
            return Err(BastionError::Config("image cannot be empty".to_string()));
        }
        if self.pod_lifetime_secs == 0 {
            return Err(BastionError::Config(
                "pod_lifetime_secs must be greater than zero".to_string(),
            ));
        }
        if self.poll_attempts == 0 {
            return Err(BastionError::Config(
                "poll_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
