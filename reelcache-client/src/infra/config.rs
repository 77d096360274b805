use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use log::warn;
use reelcache_core::{ByteSize, CacheLimits};
use serde::{Deserialize, Serialize};

use super::streaming_server::DEFAULT_HEALTH_TIMEOUT;

const APP_DIR: &str = "reelcache";
const CONFIG_FILE: &str = "config.json";

pub const ENV_CACHE_DIR: &str = "REELCACHE_CACHE_DIR";
pub const ENV_STREAMING_URL: &str = "REELCACHE_STREAMING_URL";
pub const ENV_MAX_CACHE_MB: &str = "REELCACHE_MAX_CACHE_MB";
pub const ENV_TTL_DAYS: &str = "REELCACHE_TTL_DAYS";

const SECS_PER_DAY: u64 = 24 * 60 * 60;
const BYTES_PER_MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root holding the four store directories. `None` resolves to the
    /// platform cache directory.
    pub cache_dir: Option<PathBuf>,
    pub streaming_server_url: String,
    pub max_cache_mb: u64,
    #[serde(with = "humantime_str")]
    pub cache_ttl: Duration,
    pub low_water_ratio: f64,
    #[serde(with = "humantime_str")]
    pub health_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let limits = CacheLimits::defaults();
        Self {
            cache_dir: None,
            streaming_server_url: "http://127.0.0.1:8765".to_string(),
            max_cache_mb: limits.max_bytes.as_bytes() / BYTES_PER_MIB,
            cache_ttl: limits.ttl,
            low_water_ratio: limits.low_water_ratio,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults, then `<config_dir>/reelcache/config.json` if present, then
    /// `REELCACHE_*` environment overrides.
    ///
    /// An unreadable config file is logged and skipped.
    pub fn load() -> Self {
        let mut config = Self::default_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load_from(&path) {
                Ok(config) => Some(config),
                Err(err) => {
                    warn!("ignoring config file {}: {err:#}", path.display());
                    None
                }
            })
            .unwrap_or_default();

        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow!("no config directory on this platform"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Applies `REELCACHE_*` overrides read through `lookup`. Values that do
    /// not parse are logged and ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) {
        if let Some(dir) =
            lookup(ENV_CACHE_DIR).filter(|v| !v.trim().is_empty())
        {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) =
            lookup(ENV_STREAMING_URL).filter(|v| !v.trim().is_empty())
        {
            self.streaming_server_url = url;
        }
        if let Some(raw) = lookup(ENV_MAX_CACHE_MB) {
            match raw.trim().parse::<u64>() {
                Ok(mb) => self.max_cache_mb = mb,
                Err(err) => warn!("ignoring {ENV_MAX_CACHE_MB}={raw}: {err}"),
            }
        }
        if let Some(raw) = lookup(ENV_TTL_DAYS) {
            match raw.trim().parse::<u64>() {
                Ok(days) => {
                    self.cache_ttl =
                        Duration::from_secs(days.saturating_mul(SECS_PER_DAY))
                }
                Err(err) => warn!("ignoring {ENV_TTL_DAYS}={raw}: {err}"),
            }
        }
    }

    pub fn cache_root(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let proj_dirs = ProjectDirs::from("", APP_DIR, APP_DIR)
            .ok_or_else(|| anyhow!("Failed to resolve ProjectDirs"))?;
        Ok(proj_dirs.cache_dir().to_path_buf())
    }

    pub fn cache_limits(&self) -> CacheLimits {
        CacheLimits {
            max_bytes: ByteSize::from_mib(self.max_cache_mb),
            ttl: self.cache_ttl,
            low_water_ratio: self.low_water_ratio,
        }
    }
}

mod humantime_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer
            .serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_cache_limits() {
        let config = ClientConfig::default();
        assert_eq!(config.cache_limits(), CacheLimits::defaults());
        assert_eq!(config.health_timeout, Duration::from_secs(1));
    }

    #[test]
    fn file_round_trips_with_humantime_durations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ClientConfig {
            cache_dir: Some(dir.path().join("cache")),
            cache_ttl: Duration::from_secs(7 * SECS_PER_DAY),
            ..ClientConfig::default()
        };

        config.save_to(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"cache_ttl\": \"7days\""), "{raw}");

        assert_eq!(ClientConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "max_cache_mb": 64, "health_timeout": "250ms" }"#,
        )
        .unwrap();

        let config = ClientConfig::load_from(&path).unwrap();

        assert_eq!(config.max_cache_mb, 64);
        assert_eq!(config.health_timeout, Duration::from_millis(250));
        assert_eq!(config.cache_ttl, CacheLimits::defaults().ttl);
    }

    #[test]
    fn env_overrides_apply_and_bad_values_are_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_CACHE_DIR, "/tmp/reel"),
            (ENV_STREAMING_URL, "http://10.0.0.2:9000"),
            (ENV_MAX_CACHE_MB, "not-a-number"),
            (ENV_TTL_DAYS, "2"),
        ]);
        let mut config = ClientConfig::default();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.cache_root().unwrap(), PathBuf::from("/tmp/reel"));
        assert_eq!(config.streaming_server_url, "http://10.0.0.2:9000");
        assert_eq!(config.max_cache_mb, 500);
        assert_eq!(config.cache_ttl, Duration::from_secs(2 * SECS_PER_DAY));
    }
}
