//! Configuration and run-input loading for planforge.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the planforge home directory (~/.planforge).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".planforge"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.planforge/settings.json
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or return defaults if none are configured.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::debug!("Using default settings: {}", e);
        Settings::default()
    })
}

/// Per-phase response timeouts, in milliseconds.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Timeouts {
    #[serde(default = "default_discover_ms")]
    pub discover_ms: u64,
    #[serde(default = "default_proposal_ms")]
    pub proposal_ms: u64,
    #[serde(default = "default_result_ms")]
    pub result_ms: u64,
}

fn default_discover_ms() -> u64 {
    2_000
}

fn default_proposal_ms() -> u64 {
    3_000
}

// Tasking gets the generous budget; workers do real work there.
fn default_result_ms() -> u64 {
    10_000
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            discover_ms: default_discover_ms(),
            proposal_ms: default_proposal_ms(),
            result_ms: default_result_ms(),
        }
    }
}

impl Timeouts {
    pub fn discover(&self) -> Duration {
        Duration::from_millis(self.discover_ms)
    }

    pub fn proposal(&self) -> Duration {
        Duration::from_millis(self.proposal_ms)
    }

    pub fn result(&self) -> Duration {
        Duration::from_millis(self.result_ms)
    }
}

/// planforge settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// The run's input tuple.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RunInput {
    pub region: String,
    pub product: String,
}

impl RunInput {
    pub fn new(region: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            product: product.into(),
        }
    }

    /// Read a `{ "region": ..., "product": ... }` JSON document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read input file '{}': {}", path.display(), e))
        })?;
        let input: RunInput = serde_json::from_str(&content)?;
        Ok(input)
    }

    /// Both fields must be non-blank; this is the only user-visible input
    /// failure besides a missing file.
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(Error::Config("region must not be empty".to_string()));
        }
        if self.product.trim().is_empty() {
            return Err(Error::Config("product must not be empty".to_string()));
        }
        Ok(())
    }
}
