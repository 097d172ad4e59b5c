use super::{BackendConfig, CacheBox, Config, Engine, FrontendConfig, InvalidationConfig};
use std::time::Duration;

/// Creates a new test configuration backed by the in-process engine with a
/// short default lifetime.
pub fn new_test_config() -> Config {
    Config {
        cache: CacheBox {
            backend: BackendConfig {
                engine: Engine::Memory,
                url: None,
                host: None,
                port: None,
                pool_size: None,
            },
            frontend: FrontendConfig {
                caching_enabled: true,
                serialization_enabled: true,
                default_lifetime: Duration::from_millis(500),
            },
            invalidation: InvalidationConfig {
                enabled: false,
                channel: "tagcache:clean-tags".to_string(),
                url: None,
            },
        },
    }
}
