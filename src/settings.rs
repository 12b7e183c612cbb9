use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TellerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_user")]
    pub default_user: String,
    /// Below this many parsed transactions the fallback scanner runs.
    #[serde(default = "default_fallback_min")]
    pub fallback_min_transactions: usize,
    /// Cap on rows fetched for the classifier's historical vote.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_user() -> String {
    "default".to_string()
}

fn default_fallback_min() -> usize {
    crate::parser::DEFAULT_FALLBACK_MIN_TRANSACTIONS
}

fn default_history_limit() -> usize {
    200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            default_user: default_user(),
            fallback_min_transactions: default_fallback_min(),
            history_limit: default_history_limit(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("teller.db")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("teller")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("teller")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| TellerError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            default_user: "alice".to_string(),
            fallback_min_transactions: 10,
            history_limit: 50,
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let loaded: Settings =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.default_user, "alice");
        assert_eq!(loaded.fallback_min_transactions, 10);
        assert_eq!(loaded.history_limit, 50);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let json = r#"{"data_dir": "/tmp/test"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.default_user, "default");
        assert_eq!(s.fallback_min_transactions, 25);
        assert_eq!(s.history_limit, 200);
    }

    #[test]
    fn test_db_path_is_under_data_dir() {
        let s = Settings {
            data_dir: "/tmp/teller-data".to_string(),
            ..Settings::default()
        };
        assert_eq!(s.db_path(), PathBuf::from("/tmp/teller-data/teller.db"));
    }
}
