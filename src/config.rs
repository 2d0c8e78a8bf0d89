//! Configuration loaded from `~/.clinic/config.toml`.

use crate::utils::validation::{YearRange, DEFAULT_MAX_YEAR};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Path to the binary data file (supports ~ expansion)
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Directory for JSONL session transcripts (supports ~ expansion)
    #[serde(default = "default_transcripts_dir")]
    pub transcripts_dir: String,

    /// Whether to write session transcripts at all
    #[serde(default = "default_true")]
    pub transcripts: bool,

    /// Earliest bookable year; defaults to the current year
    #[serde(default)]
    pub min_year: Option<u32>,

    /// Latest bookable year
    #[serde(default = "default_max_year")]
    pub max_year: u32,
}

fn default_data_file() -> String {
    "~/.clinic/data.dat".to_string()
}

fn default_transcripts_dir() -> String {
    "~/.clinic/sessions".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_year() -> u32 {
    DEFAULT_MAX_YEAR
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            transcripts_dir: default_transcripts_dir(),
            transcripts: default_true(),
            min_year: None,
            max_year: default_max_year(),
        }
    }
}

/// Directory holding config, history and (by default) data
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clinic")
}

impl Config {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = config_dir().join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(content)?;
        Ok(cfg)
    }

    pub fn data_path(&self) -> PathBuf {
        expand_home(&self.data_file)
    }

    pub fn transcripts_path(&self) -> PathBuf {
        expand_home(&self.transcripts_dir)
    }

    /// Bookable years. A configured minimum above the maximum is clamped.
    pub fn years(&self) -> YearRange {
        let min = self.min_year.unwrap_or_else(|| YearRange::from_now().min);
        YearRange {
            min,
            max: self.max_year.max(min),
        }
    }

    /// Check for values that cannot work, returning one message per problem.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.data_file.trim().is_empty() {
            errors.push("data_file: must not be empty".to_string());
        }
        if self.transcripts && self.transcripts_dir.trim().is_empty() {
            errors.push("transcripts_dir: must not be empty when transcripts are on".to_string());
        }
        if let Some(min) = self.min_year {
            if min > self.max_year {
                errors.push(format!(
                    "min_year: {} is after max_year {}",
                    min, self.max_year
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_toml() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.data_file, "~/.clinic/data.dat");
        assert!(cfg.transcripts);
        assert_eq!(cfg.max_year, DEFAULT_MAX_YEAR);
        assert!(cfg.min_year.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            data_file = "/srv/clinic/roster.dat"
            transcripts_dir = "/srv/clinic/log"
            transcripts = false
            min_year = 2025
            max_year = 2035
        "#;
        let cfg = Config::from_toml(toml).unwrap();
        assert_eq!(cfg.data_path(), PathBuf::from("/srv/clinic/roster.dat"));
        assert_eq!(cfg.transcripts_path(), PathBuf::from("/srv/clinic/log"));
        assert!(!cfg.transcripts);
        assert_eq!(cfg.years(), YearRange { min: 2025, max: 2035 });
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let cfg = Config {
            data_file: " ".to_string(),
            min_year: Some(2040),
            ..Config::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[1].contains("min_year"));
        // years() still yields a usable range
        assert_eq!(cfg.years(), YearRange { min: 2040, max: 2040 });
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_year = 2028\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.max_year, 2028);

        std::fs::write(&path, "max_year = \"soon\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x.dat"), home.join("x.dat"));
        }
    }
}
