// ABOUTME: Configuration management for the layercake application
// ABOUTME: Handles loading default render options and logging from files and environment variables

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::RenderOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub render: RenderOptions,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => Some(p),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(ref p) if p.exists() => {
                let contents = std::fs::read_to_string(p)?;
                serde_yaml::from_str(&contents)
                    .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {}", p.display(), e))?
            }
            _ => Config::default(),
        };

        config.merge_env()?;
        config.render.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let possible_paths = [
            PathBuf::from("layercake.yaml"),
            PathBuf::from("layercake.yml"),
            PathBuf::from(".layercake.yaml"),
            PathBuf::from(".layercake.yml"),
        ];

        // Current directory takes precedence over the home directory
        if let Some(path) = possible_paths.into_iter().find(|path| path.exists()) {
            return Some(path);
        }

        dirs::home_dir()
            .map(|home| home.join(".layercake").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("LAYERCAKE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LAYERCAKE_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(entry_point) = std::env::var("LAYERCAKE_ENTRY_POINT") {
            self.render.entry_point = entry_point;
        }
        if let Ok(fast) = std::env::var("LAYERCAKE_FAST") {
            self.render.mode.fast = fast
                .parse()
                .map_err(|_| anyhow::anyhow!("LAYERCAKE_FAST must be 'true' or 'false', got '{}'", fast))?;
        }

        Ok(())
    }
}
