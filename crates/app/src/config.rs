use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const ENV_DB_URL: &str = "TRENER_DB_URL";
pub const ENV_USER_ID: &str = "TRENER_USER_ID";
const DEFAULT_LOG: &str = "warn";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub db_url: Option<String>,
    pub user_id: Option<String>,
    pub log: Option<String>,
}

impl Config {
    /// `<config dir>/trener/config.toml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trener").join("config.toml"))
    }

    /// Load the config file.
    ///
    /// An explicit path must exist; a missing default file yields an empty config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text).map_err(|source| ConfigError::Parse { path, source }),
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Let environment variables override file values.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = non_blank(ENV_DB_URL) {
            self.db_url = Some(url);
        }
        if let Some(user) = non_blank(ENV_USER_ID) {
            self.user_id = Some(user);
        }
        self
    }

    /// Database URL: flag, then env/file, then the platform data dir.
    #[must_use]
    pub fn db_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_owned)
            .or_else(|| self.db_url.clone())
            .unwrap_or_else(default_db_path)
    }

    #[must_use]
    pub fn user_id(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_owned).or_else(|| self.user_id.clone())
    }

    /// Log filter: flag, then `RUST_LOG`, then file, then `warn`.
    #[must_use]
    pub fn log_filter(&self, flag: Option<&str>, rust_log: Option<String>) -> String {
        flag.map(str::to_owned)
            .or(rust_log)
            .or_else(|| self.log.clone())
            .unwrap_or_else(|| DEFAULT_LOG.to_owned())
    }
}

fn default_db_path() -> String {
    dirs::data_dir().map_or_else(
        || "trener.sqlite3".to_owned(),
        |dir| dir.join("trener").join("trener.sqlite3").display().to_string(),
    )
}
