// Integration tests for set/get round trips and the read-only delegations.

use super::support::new_memory_cache;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user_id: u64,
    roles: Vec<String>,
    active: bool,
}

#[tokio::test]
async fn test_string_round_trip() {
    let cache = new_memory_cache();

    cache.set("a", "hello", &[], None).await.unwrap();
    let got: Option<String> = cache.get("a").await.unwrap();
    assert_eq!(got, Some("hello".to_string()));
}

#[tokio::test]
async fn test_structured_value_round_trip() {
    let cache = new_memory_cache();
    let session = Session {
        user_id: 42,
        roles: vec!["admin".to_string(), "ops".to_string()],
        active: true,
    };

    cache
        .set("session:42", &session, &["sessions"], None)
        .await
        .unwrap();
    let got: Option<Session> = cache.get("session:42").await.unwrap();
    assert_eq!(got, Some(session));
}

#[tokio::test]
async fn test_overwrite_returns_latest_value() {
    let cache = new_memory_cache();

    cache.set("k", "first", &[], None).await.unwrap();
    cache.set("k", "second", &[], None).await.unwrap();

    let got: Option<String> = cache.get("k").await.unwrap();
    assert_eq!(got, Some("second".to_string()));
}

#[tokio::test]
async fn test_completed_set_is_visible_to_subsequent_get() {
    let cache = new_memory_cache();

    for i in 0..50u32 {
        let key = format!("seq:{i}");
        cache.set(&key, &i, &[], None).await.unwrap();
        let got: Option<u32> = cache.get(&key).await.unwrap();
        assert_eq!(got, Some(i));
    }
}

#[tokio::test]
async fn test_keys_and_size_delegations() {
    let cache = new_memory_cache();
    assert_eq!(cache.get_size().await.unwrap(), 0);

    cache.set("k1", "v", &[], None).await.unwrap();
    cache.set("k2", "v", &[], None).await.unwrap();

    assert_eq!(cache.get_size().await.unwrap(), 2);
    let mut keys = cache.get_keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["k1".to_string(), "k2".to_string()]);

    assert!(cache.has_key("k1").await.unwrap());
    assert!(!cache.has_key("k3").await.unwrap());
    assert_eq!(cache.engine_name(), "memory");
}
