use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use kabu_core::cache::error::CacheError;
use kabu_core::cache::port::Cache;
use kabu_core::common::time::{RealTimeProvider, TimeProvider};
use std::sync::Arc;

/// # Summary
/// 缓存条目：值与抓取时间。
///
/// # Invariants
/// - 条目写入后不再修改，刷新时整体替换。
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    fetched_at: DateTime<Utc>,
}

/// # Summary
/// 基于 DashMap 的带有效期内存缓存实现。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，单个键的读写互斥。
/// - 条目有效当且仅当 `now - fetched_at < ttl`，`now` 取自注入的时钟。
/// - 过期条目不会被主动清除，下一次写入时被覆盖。
pub struct MemCache {
    // 线程安全的 KV 存储容器
    storage: DashMap<String, CacheEntry>,
    // 条目有效期
    ttl: Duration,
    // 时钟
    clock: Arc<dyn TimeProvider>,
}

impl MemCache {
    /// # Summary
    /// 创建一个使用系统时钟的缓存实例。
    ///
    /// # Arguments
    /// * `ttl`: 条目有效期。
    ///
    /// # Returns
    /// * `Self` - 初始化的缓存实例。
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(RealTimeProvider))
    }

    /// # Summary
    /// 创建一个使用指定时钟的缓存实例，测试中用于注入虚拟时钟。
    pub fn with_clock(ttl: Duration, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            storage: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// 当前保存的条目数（含已过期但尚未覆盖的条目）。
    pub fn entry_count(&self) -> usize {
        self.storage.len()
    }
}

#[async_trait]
impl Cache for MemCache {
    /// # Summary
    /// 写入原始字节数据。
    ///
    /// # Logic
    /// 以当前时钟时间为抓取时间构造新条目，整体替换同名旧条目。
    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value,
            fetched_at: self.clock.now(),
        };
        self.storage.insert(key.to_string(), entry);
        Ok(())
    }

    /// # Summary
    /// 获取仍在有效期内的原始字节数据。
    ///
    /// # Logic
    /// 在分片读锁内检查有效期并克隆值，保证不会读到半写入的条目。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.now();
        Ok(self
            .storage
            .get(key)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| entry.value.clone()))
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }
}
