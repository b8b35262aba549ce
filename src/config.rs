use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

pub const KEY_DB_PATH: &str = "db_path";
pub const KEY_VOICE: &str = "voice";
pub const KEY_LOG: &str = "log";

/// Flat key/value settings stored as TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    /// `<config_dir>/pulsefit/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("pulsefit").join("config.toml"))
            .ok_or_else(|| FitError::Config("could not determine config directory".into()))
    }

    /// A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| FitError::Config(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let text = toml::to_string(self).map_err(|e| FitError::Config(e.to_string()))?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Database file, defaulting to `<data_dir>/pulsefit/pulsefit.db`.
    pub fn db_path(&self) -> Result<PathBuf> {
        if let Some(p) = self.get(KEY_DB_PATH) {
            return Ok(PathBuf::from(p));
        }

        dirs::data_dir()
            .map(|d| d.join("pulsefit").join("pulsefit.db"))
            .ok_or_else(|| FitError::Config("could not determine data directory".into()))
    }

    /// Text-to-speech command, if one is configured.
    pub fn voice(&self) -> Option<&str> {
        self.get(KEY_VOICE)
    }

    pub fn log_filter(&self) -> &str {
        self.get(KEY_LOG).unwrap_or("warn")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.log_filter(), "warn");
        assert!(cfg.voice().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulsefit").join("config.toml");

        let mut cfg = Config::default();
        cfg.map.insert(KEY_VOICE.into(), "espeak -s 150".into());
        cfg.map.insert(KEY_DB_PATH.into(), "/tmp/fit.db".into());
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.voice(), Some("espeak -s 150"));
        assert_eq!(loaded.db_path().unwrap(), PathBuf::from("/tmp/fit.db"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut cfg = Config::default();
        cfg.map.insert(KEY_VOICE.into(), "  ".into());
        assert!(cfg.voice().is_none());
    }

    #[test]
    fn garbage_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(Config::load(&path), Err(FitError::Config(_))));
    }
}
