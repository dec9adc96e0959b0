//! Runtime configuration for embedding the hearth core.
//!
//! # Responsibility
//! - Resolve data/log locations, log level and default intention.
//! - Apply `HEARTH_*` environment overrides on top of defaults.
//!
//! # Invariants
//! - `data_dir` and `log_dir` are absolute after validation.
//! - `log_level` is one of `trace|debug|info|warn|error`.

use crate::logging::{default_log_level, normalize_level};
use crate::model::intention::WEAVING;
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "HEARTH_DATA_DIR";
pub const ENV_LOG_DIR: &str = "HEARTH_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "HEARTH_LOG_LEVEL";
pub const ENV_DEFAULT_INTENTION: &str = "HEARTH_DEFAULT_INTENTION";

const DB_FILE_NAME: &str = "hearth.sqlite3";
const DATA_DIR_NAME: &str = ".sovereign-hearth";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HearthConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: &'static str,
    pub default_intention: String,
}

impl HearthConfig {
    /// Defaults rooted at `base_dir` (`<base>/hearth.sqlite3`, `<base>/logs`).
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        let data_dir = base_dir.as_ref().to_path_buf();
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            log_level: default_log_level(),
            default_intention: WEAVING.to_string(),
        }
    }

    /// Resolves configuration from the process environment.
    ///
    /// Falls back to `$HOME/.sovereign-hearth` (or the current directory) when
    /// `HEARTH_DATA_DIR` is unset.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`HearthConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let base = match non_blank(lookup(ENV_DATA_DIR)) {
            Some(dir) => PathBuf::from(dir),
            None => default_base_dir(lookup("HOME"))?,
        };
        let mut config = Self::with_base_dir(base);

        if let Some(dir) = non_blank(lookup(ENV_LOG_DIR)) {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(level) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = normalize_level(&level)?;
        }
        if let Some(intention) = non_blank(lookup(ENV_DEFAULT_INTENTION)) {
            config.default_intention = intention;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, path) in [("data_dir", &self.data_dir), ("log_dir", &self.log_dir)] {
            if !path.is_absolute() {
                return Err(format!(
                    "{name} must be an absolute path, got `{}`",
                    path.display()
                ));
            }
        }
        Ok(())
    }
}

fn default_base_dir(home: Option<String>) -> Result<PathBuf, String> {
    match non_blank(home) {
        Some(home) => Ok(PathBuf::from(home).join(DATA_DIR_NAME)),
        None => std::env::current_dir()
            .map(|dir| dir.join(DATA_DIR_NAME))
            .map_err(|err| format!("cannot resolve data directory: {err}")),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
