use chrono::{Duration, TimeZone, Utc};
use kabu_cache::mem::MemCache;
use kabu_core::cache::port::{Cache, CacheExt};
use kabu_core::common::time::FakeClockProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestItem {
    symbol: String,
    change: f64,
}

fn setup(ttl_secs: i64) -> (MemCache, Arc<FakeClockProvider>) {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap();
    let clock = Arc::new(FakeClockProvider::new(t0));
    let cache = MemCache::with_clock(Duration::seconds(ttl_secs), clock.clone());
    (cache, clock)
}

#[tokio::test]
async fn test_mem_cache_raw_ops() {
    let (cache, _) = setup(300);
    let key = "raw_key";
    let value = vec![1, 2, 3, 4];

    // 测试存取
    cache.put_raw(key, value.clone()).await.unwrap();
    let result = cache.get_raw(key).await.unwrap().unwrap();
    assert_eq!(result, value);

    // 测试失效
    cache.invalidate(key).await.unwrap();
    let result = cache.get_raw(key).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_mem_cache_typed_ops() {
    let (cache, _) = setup(300);
    let item = TestItem {
        symbol: "NVDA".to_string(),
        change: 0.1 + 0.2,
    };

    cache.put("typed_key", &item).await.unwrap();

    // 浮点数必须逐位还原
    let result: TestItem = cache.get("typed_key").await.unwrap().unwrap();
    assert_eq!(result, item);
    assert_eq!(result.change.to_bits(), (0.1f64 + 0.2).to_bits());
}

#[tokio::test]
async fn test_entry_fresh_just_before_ttl() {
    let (cache, clock) = setup(300);
    cache.put_raw("k", vec![7]).await.unwrap();

    clock.advance(Duration::seconds(300) - Duration::milliseconds(1));
    assert_eq!(cache.get_raw("k").await.unwrap(), Some(vec![7]));
}

#[tokio::test]
async fn test_entry_stale_after_ttl() {
    let (cache, clock) = setup(300);
    cache.put_raw("k", vec![7]).await.unwrap();

    clock.advance(Duration::seconds(300) + Duration::milliseconds(1));
    assert!(cache.get_raw("k").await.unwrap().is_none());

    // 过期条目不会被主动清除
    assert_eq!(cache.entry_count(), 1);
}

#[tokio::test]
async fn test_refresh_replaces_entry_and_restarts_ttl() {
    let (cache, clock) = setup(60);
    cache.put_raw("k", vec![1]).await.unwrap();

    clock.advance(Duration::seconds(61));
    assert!(cache.get_raw("k").await.unwrap().is_none());

    cache.put_raw("k", vec![2]).await.unwrap();
    clock.advance(Duration::seconds(30));
    assert_eq!(cache.get_raw("k").await.unwrap(), Some(vec![2]));
}

#[tokio::test]
async fn test_typed_get_with_wrong_shape_is_deserialize_error() {
    let (cache, _) = setup(60);
    cache.put_raw("k", b"not json".to_vec()).await.unwrap();
    let result = cache.get::<TestItem>("k").await;
    assert!(result.is_err());
}
