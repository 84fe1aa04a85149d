use crate::limiter::RateLimiter;
use crate::locks::KeyedLocks;
use kabu_core::cache::port::{Cache, CacheExt};
use kabu_core::common::{HistoryWindow, Stock, normalize_symbol};
use kabu_core::market::entity::PriceSeries;
use kabu_core::market::error::MarketError;
use kabu_core::market::port::MarketDataProvider;
use std::sync::Arc;
use tracing::{debug, warn};

/// # Summary
/// 历史行情缓存：在限流的上游数据源之前提供带 TTL 的 K 线序列。
///
/// # Invariants
/// - 每个 (symbol, window) 在一个刷新周期内最多回源一次。
/// - 所有回源请求都经过注入的 `RateLimiter`。
/// - 缓存读写失败只记录日志，不影响调用结果。
pub struct HistoryCache {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<dyn Cache>,
    limiter: Arc<RateLimiter>,
    /// 同一 (symbol, window) 同时只允许一次回源。
    fetch_locks: KeyedLocks,
}

impl HistoryCache {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<dyn Cache>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            provider,
            cache,
            limiter,
            fetch_locks: KeyedLocks::new(),
        }
    }

    fn key(symbol: &str, window: HistoryWindow) -> String {
        format!("history:{}:{}", symbol, window)
    }

    async fn cached(&self, key: &str) -> Option<PriceSeries> {
        match self.cache.get::<PriceSeries>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "History cache read failed, treating as miss");
                None
            }
        }
    }

    /// # Summary
    /// 获取指定窗口的历史 K 线序列。
    ///
    /// # Logic
    /// 1. 先查缓存，命中直接返回。
    /// 2. 获取该键的抓取锁后再次查缓存（并发等待者在此命中）。
    /// 3. 经限流器回源，将原始 K 线构造为 `PriceSeries`。
    /// 4. 先写缓存再返回。
    ///
    /// # Arguments
    /// * `symbol`: 证券代码，内部会做规范化。
    /// * `window`: 回溯范围与 K 线周期。
    ///
    /// # Returns
    /// 成功返回序列；上游不可用或无数据时返回 `Upstream`，
    /// 未知代码返回 `NotFound`，不足两根 K 线返回 `InsufficientData`。
    pub async fn get_history(
        &self,
        symbol: &str,
        window: HistoryWindow,
    ) -> Result<PriceSeries, MarketError> {
        let symbol = normalize_symbol(symbol);
        let key = Self::key(&symbol, window);

        if let Some(series) = self.cached(&key).await {
            return Ok(series);
        }

        let _guard = self.fetch_locks.lock(&key).await;

        if let Some(series) = self.cached(&key).await {
            debug!(key = %key, "History filled by concurrent fetch");
            return Ok(series);
        }

        let stock = Stock::new(&symbol);
        let candles = self
            .limiter
            .run(self.provider.fetch_candles(&stock, window))
            .await?;

        if candles.is_empty() {
            return Err(MarketError::Upstream(format!(
                "no rows returned for {} ({})",
                symbol, window
            )));
        }

        let series = PriceSeries::new(symbol, candles)?;
        if let Err(e) = self.cache.put(&key, &series).await {
            warn!(key = %key, error = %e, "History cache write failed");
        }
        debug!(key = %key, bars = series.len(), "History fetched from upstream");
        Ok(series)
    }

    /// 使指定窗口的缓存失效，下一次访问将回源。
    pub async fn invalidate(&self, symbol: &str, window: HistoryWindow) {
        let key = Self::key(&normalize_symbol(symbol), window);
        if let Err(e) = self.cache.invalidate(&key).await {
            warn!(key = %key, error = %e, "History cache invalidate failed");
        }
    }
}
