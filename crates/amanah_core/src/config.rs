//! Runtime configuration for hosts embedding the core.
//!
//! Nothing in the core reads the environment on its own. Hosts call
//! [`CoreConfig::from_env`] (or build a [`CoreConfig`] directly) and pass the
//! values on.

use crate::logging::default_log_level;
use crate::repo::SeedMode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "AMANAH_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "AMANAH_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "AMANAH_LOG_DIR";
pub const ENV_SEED: &str = "AMANAH_SEED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidSeedMode(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSeedMode(value) => write!(
                f,
                "unsupported {ENV_SEED} value `{value}`; expected demo|empty"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// `None` opens an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// `None` disables file logging.
    pub log_dir: Option<String>,
    pub seed: SeedMode,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            seed: SeedMode::default(),
        }
    }
}

impl CoreConfig {
    /// Reads `AMANAH_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR);
        if let Some(seed) = read(ENV_SEED) {
            config.seed = SeedMode::parse(&seed).ok_or(ConfigError::InvalidSeedMode(seed))?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_SEED};
    use crate::repo::SeedMode;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.seed, SeedMode::Demo);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn reads_path_and_seed() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, " /tmp/amanah.db "),
            (ENV_SEED, "EMPTY"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/amanah.db")));
        assert_eq!(config.seed, SeedMode::Empty);
    }

    #[test]
    fn rejects_unknown_seed_mode() {
        let err = CoreConfig::from_lookup(lookup(&[(ENV_SEED, "lots")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidSeedMode("lots".to_string()));
    }
}
