use crate::logging::LogLevel;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

const CONFIG_FILE: &str = "configuration.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extension of the progress file kept next to each book.
    pub sidecar_extension: String,
    pub book_descriptor: String,
    pub toc_descriptor: String,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sidecar_extension: "alx".to_string(),
            book_descriptor: "book.xml".to_string(),
            toc_descriptor: "toc.xml".to_string(),
            log_level: LogLevel::Warn,
        }
    }
}

impl Config {
    /// Loads `configuration.json` from the application data directory,
    /// writing the defaults there on first run.
    pub fn new() -> Result<Self> {
        let prefix = get_app_data_prefix()?;
        let filepath = prefix.join(CONFIG_FILE);

        if filepath.exists() {
            let config_str = fs::read_to_string(&filepath)?;
            match serde_json::from_str::<serde_json::Value>(&config_str) {
                Ok(value) => Ok(Self::from_value(&value)),
                Err(_) => Ok(Self::default()),
            }
        } else {
            let config = Self::default();
            fs::create_dir_all(&prefix)?;
            fs::write(&filepath, serde_json::to_string_pretty(&config)?)?;
            Ok(config)
        }
    }

    /// Loads an explicit configuration file. Unlike [`Config::new`], a file
    /// that cannot be read or is not JSON is an error.
    pub fn from_file(filepath: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(filepath)?;
        let value = serde_json::from_str::<serde_json::Value>(&config_str)?;
        Ok(Self::from_value(&value))
    }

    /// Field-by-field so that one bad value only resets itself.
    fn from_value(value: &serde_json::Value) -> Self {
        let mut config = Self::default();

        if let Some(val) = value.get("sidecar_extension").and_then(|v| v.as_str()) {
            let val = val.trim_start_matches('.');
            if !val.is_empty() {
                config.sidecar_extension = val.to_string();
            }
        }
        if let Some(val) = value.get("book_descriptor").and_then(|v| v.as_str()) {
            config.book_descriptor = val.to_string();
        }
        if let Some(val) = value.get("toc_descriptor").and_then(|v| v.as_str()) {
            config.toc_descriptor = val.to_string();
        }
        if let Some(val) = value
            .get("log_level")
            .and_then(|v| LogLevel::deserialize(v).ok())
        {
            config.log_level = val;
        }

        config
    }

    pub fn save_to(&self, filepath: &Path) -> Result<()> {
        if let Some(parent) = filepath.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(filepath, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub fn get_app_data_prefix() -> Result<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(config_home).join("albite"));
    } else if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home.clone()).join(".config").join("albite");
        if path.exists() {
            return Ok(path);
        } else {
            return Ok(PathBuf::from(home).join(".albite"));
        }
    } else if let Some(user_profile) = std::env::var_os("USERPROFILE") {
        return Ok(PathBuf::from(user_profile).join(".albite"));
    }

    Err(eyre::eyre!(
        "Could not determine application data directory"
    ))
}
