// Configuration file loading

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::ClearPrdConfig;

/// Config loader
pub struct ConfigLoader {
    /// Global config path
    global_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader using the platform config directory
    pub fn new() -> Self {
        Self {
            global_path: Self::get_global_config_path(),
        }
    }

    /// Use an explicit config file instead of the global one
    pub fn with_path(path: &Path) -> Self {
        Self {
            global_path: Some(path.to_path_buf()),
        }
    }

    /// Get the global config path
    fn get_global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("clearprd").join("config.toml"))
    }

    /// Load the configured file, if it exists
    pub fn load(&self) -> Result<Option<ClearPrdConfig>> {
        match self.global_path {
            Some(ref path) => self.load_from_path(path),
            None => Ok(None),
        }
    }

    /// Load config from a specific path
    pub fn load_from_path(&self, path: &Path) -> Result<Option<ClearPrdConfig>> {
        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: ClearPrdConfig = toml::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;

        validate_config(&config)?;

        log::info!("Loaded config from {}", path.display());
        Ok(Some(config))
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path, config: &ClearPrdConfig) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    anyhow!("Failed to create config directory '{}': {}", parent.display(), e)
                })?;
            }
        }

        validate_config(config)?;

        let contents = toml::to_string_pretty(config)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        fs::write(path, contents)
            .map_err(|e| anyhow!("Failed to write config file '{}': {}", path.display(), e))?;

        log::info!("Saved config to: {}", path.display());
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate config values
pub fn validate_config(config: &ClearPrdConfig) -> Result<()> {
    if config.interview.tick_interval_ms == 0 {
        return Err(anyhow!("tickIntervalMs must be greater than 0"));
    }

    if config.tips.interval_secs == 0 {
        return Err(anyhow!("tips intervalSecs must be greater than 0"));
    }

    if config.tips.messages.iter().all(|m| m.trim().is_empty()) {
        return Err(anyhow!("tips messages must contain at least one tip"));
    }

    Ok(())
}
