//! Configuration loading from the process environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `USE_PERSISTENT_STORES` | `false` (in-memory stores and bus) |
//! | `DATABASE_URL` | built from `PGUSER`/`PGPASSWORD`/`PGHOST`/`PGPORT`/`PGDATABASE` when `PGHOST` is set |
//! | `REDIS_URL` | `redis://{REDIS_HOST}:{REDIS_PORT}`, i.e. `redis://localhost:6379` |
//! | `MAX_INDEX` | `40` (at most 93) |
//! | `JOB_CHANNEL` | `insert` |
//! | `CACHE_HASH_KEY` | `values` |
//! | `BIND_ADDR` | `0.0.0.0:5000` |

use thiserror::Error;

use fibcalc_core::IndexLimit;
use fibcalc_events::DEFAULT_JOB_CHANNEL;

use crate::cache::DEFAULT_CACHE_HASH_KEY;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when persistent stores are enabled")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub redis_url: String,
    pub max_index: IndexLimit,
    pub job_channel: String,
    pub cache_hash_key: String,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            use_persistent_stores: false,
            database_url: None,
            redis_url: "redis://localhost:6379".to_string(),
            max_index: IndexLimit::default(),
            job_channel: DEFAULT_JOB_CHANNEL.to_string(),
            cache_hash_key: DEFAULT_CACHE_HASH_KEY.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (tests use a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let use_persistent_stores = match var("USE_PERSISTENT_STORES") {
            Some(v) => v.trim().parse::<bool>().map_err(|e| ConfigError::Invalid {
                key: "USE_PERSISTENT_STORES",
                value: v.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.use_persistent_stores,
        };

        let max_index = match var("MAX_INDEX") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .map_err(|e| e.to_string())
                .and_then(|max| IndexLimit::try_new(max).map_err(|e| e.to_string()))
                .map_err(|reason| ConfigError::Invalid {
                    key: "MAX_INDEX",
                    value: v.clone(),
                    reason,
                })?,
            None => defaults.max_index,
        };

        let database_url = var("DATABASE_URL").or_else(|| {
            var("PGHOST").map(|host| {
                format!(
                    "postgres://{}:{}@{}:{}/{}",
                    var("PGUSER").unwrap_or_else(|| "postgres".to_string()),
                    var("PGPASSWORD").unwrap_or_default(),
                    host,
                    var("PGPORT").unwrap_or_else(|| "5432".to_string()),
                    var("PGDATABASE").unwrap_or_else(|| "postgres".to_string()),
                )
            })
        });

        let redis_url = var("REDIS_URL").unwrap_or_else(|| {
            format!(
                "redis://{}:{}",
                var("REDIS_HOST").unwrap_or_else(|| "localhost".to_string()),
                var("REDIS_PORT").unwrap_or_else(|| "6379".to_string()),
            )
        });

        Ok(Self {
            use_persistent_stores,
            database_url,
            redis_url,
            max_index,
            job_channel: var("JOB_CHANNEL").unwrap_or(defaults.job_channel),
            cache_hash_key: var("CACHE_HASH_KEY").unwrap_or(defaults.cache_hash_key),
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }

    /// Database URL, required in persistent mode.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL (or PGHOST)"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        assert_eq!(load(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn component_variables_build_urls() {
        let cfg = load(&[
            ("PGHOST", "db"),
            ("PGUSER", "app"),
            ("PGPASSWORD", "secret"),
            ("PGDATABASE", "values"),
            ("REDIS_HOST", "cache"),
            ("REDIS_PORT", "6380"),
        ])
        .unwrap();

        assert_eq!(cfg.database_url.as_deref(), Some("postgres://app:secret@db:5432/values"));
        assert_eq!(cfg.redis_url, "redis://cache:6380");
    }

    #[test]
    fn explicit_urls_win() {
        let cfg = load(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("PGHOST", "ignored"),
            ("REDIS_URL", "redis://r:1"),
        ])
        .unwrap();
        assert_eq!(cfg.require_database_url().unwrap(), "postgres://x/y");
        assert_eq!(cfg.redis_url, "redis://r:1");
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            load(&[("MAX_INDEX", "lots")]),
            Err(ConfigError::Invalid { key: "MAX_INDEX", .. })
        ));
        assert!(matches!(
            load(&[("USE_PERSISTENT_STORES", "yes")]),
            Err(ConfigError::Invalid { key: "USE_PERSISTENT_STORES", .. })
        ));
    }

    #[test]
    fn max_index_past_u64_range_is_rejected() {
        assert_eq!(load(&[("MAX_INDEX", "93")]).unwrap().max_index.max(), 93);
        for raw in ["94", "1000000"] {
            assert!(matches!(
                load(&[("MAX_INDEX", raw)]),
                Err(ConfigError::Invalid { key: "MAX_INDEX", .. })
            ));
        }
    }

    #[test]
    fn overrides_apply() {
        let cfg = load(&[("MAX_INDEX", "30"), ("JOB_CHANNEL", "jobs"), ("USE_PERSISTENT_STORES", "true")]).unwrap();
        assert_eq!(cfg.max_index.max(), 30);
        assert_eq!(cfg.job_channel, "jobs");
        assert!(cfg.use_persistent_stores);
        assert!(matches!(cfg.require_database_url(), Err(ConfigError::Missing(_))));
    }
}
