//! Configuration Module
//!
//! Handles the process-wide cache options and their shallow merge.
//!
//! Options serialize with camelCase names and durations in milliseconds:
//!
//! ```json
//! { "ttl": 0, "errorOrNull": false, "autoRefresh": true, "refreshInterval": 10000 }
//! ```

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CacheError, Result};

/// Default refresh interval for auto-refreshing entries.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(10_000);

/// Cache configuration.
///
/// Changes apply to subsequent operations only; timers that are already
/// scheduled keep the durations they were armed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// Default TTL for entries stored without one. Zero = never expire
    #[serde(with = "millis")]
    pub ttl: Duration,
    /// Raise `NotExistKey` from sync reads/deletes instead of returning null
    pub error_or_null: bool,
    /// Whether `set_auto_refresh` is allowed at all
    pub auto_refresh: bool,
    /// Default interval between refreshes
    #[serde(with = "millis")]
    pub refresh_interval: Duration,
    /// Unrecognized options, kept as given
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::ZERO,
            error_or_null: false,
            auto_refresh: true,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            extra: Map::new(),
        }
    }
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MS` - Default TTL in milliseconds (default: 0, never expire)
    /// - `CACHE_ERROR_OR_NULL` - Raise on missing keys (default: false)
    /// - `CACHE_AUTO_REFRESH` - Allow auto-refresh (default: true)
    /// - `CACHE_REFRESH_INTERVAL_MS` - Refresh interval in milliseconds (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: env_parse::<u64>("CACHE_TTL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.ttl),
            error_or_null: env_parse("CACHE_ERROR_OR_NULL").unwrap_or(defaults.error_or_null),
            auto_refresh: env_parse("CACHE_AUTO_REFRESH").unwrap_or(defaults.auto_refresh),
            refresh_interval: env_parse::<u64>("CACHE_REFRESH_INTERVAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.refresh_interval),
            extra: defaults.extra,
        }
    }

    // == Merge ==
    /// Shallow-merges a patch: fields set in the patch replace the current
    /// ones, everything else is kept. Unknown fields are carried over.
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(ttl) = patch.ttl {
            self.ttl = ttl;
        }
        if let Some(error_or_null) = patch.error_or_null {
            self.error_or_null = error_or_null;
        }
        if let Some(auto_refresh) = patch.auto_refresh {
            self.auto_refresh = auto_refresh;
        }
        if let Some(refresh_interval) = patch.refresh_interval {
            self.refresh_interval = refresh_interval;
        }
        self.extra.extend(patch.extra);
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// == Config Patch ==
/// A partial configuration, as accepted by [`crate::Cache::configure`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, with = "opt_millis")]
    pub ttl: Option<Duration>,
    #[serde(default)]
    pub error_or_null: Option<bool>,
    #[serde(default)]
    pub auto_refresh: Option<bool>,
    #[serde(default, with = "opt_millis")]
    pub refresh_interval: Option<Duration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a patch from a JSON object such as `{"errorOrNull": true}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CacheError::InputArguments(format!("invalid configuration: {}", e)))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_error_or_null(mut self, error_or_null: bool) -> Self {
        self.error_or_null = Some(error_or_null);
        self
    }

    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = Some(auto_refresh);
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::ZERO);
        assert!(!config.error_or_null);
        assert!(config.auto_refresh);
        assert_eq!(config.refresh_interval, Duration::from_millis(10_000));
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_TTL_MS");
        env::remove_var("CACHE_ERROR_OR_NULL");
        env::remove_var("CACHE_AUTO_REFRESH");
        env::remove_var("CACHE_REFRESH_INTERVAL_MS");

        assert_eq!(CacheConfig::from_env(), CacheConfig::default());
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let mut config = CacheConfig::default();
        config.merge(ConfigPatch::new().with_ttl(Duration::from_millis(500)));
        config.merge(ConfigPatch::new().with_error_or_null(true));

        assert_eq!(config.ttl, Duration::from_millis(500));
        assert!(config.error_or_null);
        assert!(config.auto_refresh);
        assert_eq!(config.refresh_interval, DEFAULT_REFRESH_INTERVAL);
    }

    #[test]
    fn test_patch_from_json_preserves_unknown_fields() {
        let patch =
            ConfigPatch::from_json(r#"{"refreshInterval": 250, "namespace": "users"}"#).unwrap();
        assert_eq!(patch.refresh_interval, Some(Duration::from_millis(250)));
        assert_eq!(patch.ttl, None);

        let mut config = CacheConfig::default();
        config.merge(patch);
        assert_eq!(config.refresh_interval, Duration::from_millis(250));
        assert_eq!(config.extra.get("namespace"), Some(&Value::from("users")));
    }

    #[test]
    fn test_patch_from_json_rejects_malformed_input() {
        let err = ConfigPatch::from_json(r#"{"ttl": "soon"}"#).unwrap_err();
        assert!(matches!(err, CacheError::InputArguments(_)));
    }

    #[test]
    fn test_config_serializes_with_original_names() {
        let json = serde_json::to_value(CacheConfig::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ttl": 0,
                "errorOrNull": false,
                "autoRefresh": true,
                "refreshInterval": 10000
            })
        );
    }
}
