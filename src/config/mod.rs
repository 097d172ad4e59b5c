// Configuration loading and management.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_CLEAN_TAGS_CHANNEL: &str = "tagcache:clean-tags";

/// Storage engine selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Memory,
    Redis,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Memory => "memory",
            Engine::Redis => "redis",
        }
    }
}

/// Root configuration wrapper; the YAML document nests everything under a
/// single `cache:` key.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "cache", default)]
    pub cache: CacheBox,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CacheBox {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub invalidation: InvalidationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_engine")]
    pub engine: Engine,
    /// Full connection URL for the redis engine, e.g. `redis://host:6379`.
    /// Takes precedence over `host`/`port`.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Connection pool size for the redis engine.
    pub pool_size: Option<usize>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            url: None,
            host: None,
            port: None,
            pool_size: None,
        }
    }
}

impl BackendConfig {
    /// Resolves the redis connection URL from `url` or `host`/`port`.
    pub fn redis_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let host = self.host.as_deref().unwrap_or("127.0.0.1");
        let port = self.port.unwrap_or(DEFAULT_REDIS_PORT);
        format!("redis://{}:{}", host, port)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrontendConfig {
    #[serde(default = "default_true")]
    pub caching_enabled: bool,
    #[serde(default = "default_true")]
    pub serialization_enabled: bool,
    /// Lifetime applied when `set` is called without one.
    #[serde(default = "default_lifetime", with = "humantime_serde")]
    pub default_lifetime: Duration,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            serialization_enabled: true,
            default_lifetime: default_lifetime(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvalidationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Well-known pub/sub channel shared by all participating processes.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Transport URL; falls back to the backend redis URL when omitted.
    pub url: Option<String>,
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channel: default_channel(),
            url: None,
        }
    }
}

fn default_engine() -> Engine {
    Engine::Memory
}

fn default_true() -> bool {
    true
}

fn default_lifetime() -> Duration {
    Duration::from_secs(10)
}

fn default_channel() -> String {
    DEFAULT_CLEAN_TAGS_CHANNEL.to_string()
}

impl Config {
    /// Loads the configuration struct from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        let cfg: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("unmarshal yaml from {:?}", abs_path))?;

        cfg.validate()
            .with_context(|| format!("validate config from {:?}", abs_path))?;

        Ok(cfg)
    }

    /// Validates the configuration once at load time; unknown YAML keys
    /// were already ignored during deserialization.
    pub fn validate(&self) -> Result<()> {
        if let Some(size) = self.cache.backend.pool_size {
            if size == 0 {
                bail!("backend.pool_size must be greater than zero");
            }
        }
        if self.cache.invalidation.enabled && self.cache.invalidation.channel.is_empty() {
            bail!("invalidation.channel must not be empty");
        }
        Ok(())
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.cache.backend
    }

    pub fn frontend(&self) -> &FrontendConfig {
        &self.cache.frontend
    }

    pub fn invalidation(&self) -> &InvalidationConfig {
        &self.cache.invalidation
    }

    /// Resolves the invalidation transport URL, falling back to the
    /// backend redis URL.
    pub fn invalidation_url(&self) -> String {
        self.cache
            .invalidation
            .url
            .clone()
            .unwrap_or_else(|| self.cache.backend.redis_url())
    }
}

mod test_config;

pub use test_config::new_test_config;
