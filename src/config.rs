use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::db::connection;
use crate::error::{PlanworkError, Result};

pub const DEFAULT_RETENTION_DAYS: u32 = 30;
pub const MAX_RETENTION_DAYS: u32 = 36500;
pub const DEFAULT_ARCHIVE_PAGE_SIZE: u32 = 20;
pub const MAX_ARCHIVE_PAGE_SIZE: u32 = 100;

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_archive_page_size() -> u32 {
    DEFAULT_ARCHIVE_PAGE_SIZE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub active_user_id: Option<String>,
    /// Completed tasks older than this many days are removed by `cleanup`.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_archive_page_size")]
    pub archive_page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_user_id: None,
            retention_days: DEFAULT_RETENTION_DAYS,
            archive_page_size: DEFAULT_ARCHIVE_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load from the data directory. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&connection::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| PlanworkError::config(e.to_string()))?;
        serde_json::from_str(&content)
            .map_err(|e| PlanworkError::config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&connection::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PlanworkError::config(e.to_string()))?;
        }
        let body = serde_json::to_string_pretty(self).map_err(|e| PlanworkError::config(e.to_string()))?;
        fs::write(path, body).map_err(|e| PlanworkError::config(e.to_string()))?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Apply a `config set <key> <value>` assignment.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "retention_days" => {
                let days: u32 = value
                    .parse()
                    .map_err(|_| PlanworkError::validation(format!("retention_days must be a whole number, got '{value}'")))?;
                if days == 0 || days > MAX_RETENTION_DAYS {
                    return Err(PlanworkError::validation(format!(
                        "retention_days must be between 1 and {MAX_RETENTION_DAYS}"
                    )));
                }
                self.retention_days = days;
            }
            "archive_page_size" => {
                let size: u32 = value
                    .parse()
                    .map_err(|_| PlanworkError::validation(format!("archive_page_size must be a whole number, got '{value}'")))?;
                if size == 0 || size > MAX_ARCHIVE_PAGE_SIZE {
                    return Err(PlanworkError::validation(format!(
                        "archive_page_size must be between 1 and {MAX_ARCHIVE_PAGE_SIZE}"
                    )));
                }
                self.archive_page_size = size;
            }
            _ => {
                return Err(PlanworkError::validation(format!(
                    "unknown config key '{key}' (expected retention_days or archive_page_size)"
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"active_user_id":"01ABC"}"#).unwrap();
        assert_eq!(config.active_user_id.as_deref(), Some("01ABC"));
        assert_eq!(config.retention_days, DEFAULT_RETENTION_DAYS);
        assert_eq!(config.archive_page_size, DEFAULT_ARCHIVE_PAGE_SIZE);
    }

    #[test]
    fn set_validates_values() {
        let mut config = Config::default();
        config.set("retention_days", "7").unwrap();
        assert_eq!(config.retention_days, 7);
        assert!(config.set("retention_days", "0").is_err());
        assert!(config.set("retention_days", "soon").is_err());
        assert!(config.set("retention_days", "4294967295").is_err());
        config.set("retention_days", &MAX_RETENTION_DAYS.to_string()).unwrap();
        assert_eq!(config.retention_days, MAX_RETENTION_DAYS);
        assert!(config.set("archive_page_size", "500").is_err());
        assert!(config.set("colour", "red").is_err());
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let mut config = Config::default();
        config.active_user_id = Some("u1".to_string());
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
