use crate::event_store::GrantPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    pub default_calendar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct AccessConfig {
    /// How the simulated Settings answer access prompts.
    pub grant_policy: GrantPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendar: CalendarConfig { default_calendar: Some("Personal".to_string()) },
            catalog: CatalogConfig { path: Some(PathBuf::from("data/lessons.json")) },
            access: AccessConfig { grant_policy: GrantPolicy::AlwaysFull },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        // If config doesn't exist, create default
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save()?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog.path.clone().unwrap_or_else(|| PathBuf::from("data/lessons.json"))
    }
}

fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "poolbook", "poolbook")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.calendar.default_calendar, Some("Personal".to_string()));
        assert_eq!(config.catalog_path(), PathBuf::from("data/lessons.json"));
        assert!(matches!(config.access.grant_policy, GrantPolicy::AlwaysFull));
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.calendar.default_calendar, config.calendar.default_calendar);
        assert!(matches!(parsed.access.grant_policy, GrantPolicy::AlwaysFull));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str("[access]\ngrant_policy = \"always-write-only\"").unwrap();
        assert!(matches!(parsed.access.grant_policy, GrantPolicy::AlwaysWriteOnly));
        assert_eq!(parsed.calendar.default_calendar, None);
    }
}
