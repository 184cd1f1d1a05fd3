//! Configuration manager for loading and saving world host configuration

use std::path::{Path, PathBuf};

use super::WorldConfig;

/// Configuration error types
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error during file operations
    Io(String),
    /// Error during serialization
    Serialize(String),
    /// Error during deserialization
    Deserialize(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO error: {}", msg),
            ConfigError::Serialize(msg) => write!(f, "Serialization error: {}", msg),
            ConfigError::Deserialize(msg) => write!(f, "Deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Loads, saves and tracks changes to a RON configuration file
pub struct ConfigManager {
    config: WorldConfig,
    config_path: PathBuf,
    dirty: bool,
}

impl ConfigManager {
    /// Load the configuration at `path`
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = path.into();
        let content =
            std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: WorldConfig =
            ron::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;

        if config.version > WorldConfig::CURRENT_VERSION {
            tracing::warn!(
                "Config {:?} has version {}, newer than supported {}",
                config_path,
                config.version,
                WorldConfig::CURRENT_VERSION
            );
        }
        tracing::info!("Loaded config from {:?}", config_path);

        Ok(Self {
            config,
            config_path,
            dirty: false,
        })
    }

    /// Load the configuration at `path`, falling back to defaults
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let config_path = path.into();
        match Self::load(config_path.clone()) {
            Ok(manager) => manager,
            Err(e) => {
                tracing::info!("Using default config ({})", e);
                Self {
                    config: WorldConfig::default(),
                    config_path,
                    dirty: false,
                }
            }
        }
    }

    /// Get a reference to the current configuration
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Get a mutable reference to the configuration (marks as dirty)
    pub fn config_mut(&mut self) -> &mut WorldConfig {
        self.dirty = true;
        &mut self.config
    }

    /// Take the configuration out of the manager
    pub fn into_config(self) -> WorldConfig {
        self.config
    }

    /// Check if the configuration has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Save the configuration to disk
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content = ron::ser::to_string_pretty(&self.config, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(&self.config_path, &content).map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::info!("Saved config to {:?}", self.config_path);
        self.dirty = false;
        Ok(())
    }

    /// Get the config file path
    pub fn config_file_path(&self) -> &Path {
        &self.config_path
    }
}
