//! Shared helpers for integration cases.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{new_test_config, Config};
use crate::frontend::Cache;

/// Initializes test logging once; repeated calls are harmless.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Memory-backed cache with the standard test configuration.
pub fn new_memory_cache() -> Arc<Cache> {
    init_logging();
    Cache::new(new_test_config()).unwrap()
}

/// Memory-backed cache with a custom default lifetime.
pub fn new_memory_cache_with_lifetime(lifetime: Duration) -> Arc<Cache> {
    init_logging();
    let mut cfg: Config = new_test_config();
    cfg.cache.frontend.default_lifetime = lifetime;
    Cache::new(cfg).unwrap()
}
