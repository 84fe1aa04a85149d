use crate::history::HistoryCache;
use crate::indicator::compute_indicators;
use crate::locks::KeyedLocks;
use kabu_core::cache::port::Cache;
use kabu_core::chart::entity::{ChartKind, ChartPeriod};
use kabu_core::chart::port::ChartRenderer;
use kabu_core::common::normalize_symbol;
use kabu_core::market::error::MarketError;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// # Summary
/// 图表缓存：在渲染器之前缓存已编码的图片。
///
/// # Invariants
/// - 同一 (symbol, period, kind) 并发请求只渲染一次。
/// - 渲染器返回 `None` 时不写缓存，下次请求会重新渲染。
/// - 渲染在阻塞线程池中执行，不占用异步工作线程。
pub struct ChartCache {
    history: Arc<HistoryCache>,
    renderer: Arc<dyn ChartRenderer>,
    cache: Arc<dyn Cache>,
    render_locks: KeyedLocks,
}

impl ChartCache {
    pub fn new(
        history: Arc<HistoryCache>,
        renderer: Arc<dyn ChartRenderer>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            history,
            renderer,
            cache,
            render_locks: KeyedLocks::new(),
        }
    }

    /// 渲染结果的 MIME 类型。
    pub fn content_type(&self) -> &'static str {
        self.renderer.content_type()
    }

    fn key(symbol: &str, period: ChartPeriod, kind: ChartKind) -> String {
        format!("chart:{}:{}:{}", symbol, period, kind)
    }

    async fn cached(&self, key: &str) -> Option<Vec<u8>> {
        match self.cache.get_raw(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "Chart cache read failed, treating as miss");
                None
            }
        }
    }

    /// # Summary
    /// 获取图表，未命中时渲染并缓存。
    ///
    /// # Logic
    /// 1. 查缓存，命中直接返回。
    /// 2. 获取该键的渲染锁后再次查缓存。
    /// 3. 按图表跨度从历史缓存取序列；指标图额外计算指标。
    /// 4. 在阻塞线程池中渲染，非空结果写入缓存。
    ///
    /// # Returns
    /// 图片字节；数据不足以成图时为 `Ok(None)`；历史数据错误原样返回。
    pub async fn get_or_render(
        &self,
        symbol: &str,
        period: ChartPeriod,
        kind: ChartKind,
    ) -> Result<Option<Vec<u8>>, MarketError> {
        let symbol = normalize_symbol(symbol);
        let key = Self::key(&symbol, period, kind);

        if let Some(bytes) = self.cached(&key).await {
            return Ok(Some(bytes));
        }

        let _guard = self.render_locks.lock(&key).await;

        if let Some(bytes) = self.cached(&key).await {
            return Ok(Some(bytes));
        }

        let series = self.history.get_history(&symbol, period.window()).await?;
        let renderer = self.renderer.clone();
        let title = symbol.clone();

        let rendered = tokio::task::spawn_blocking(move || {
            let indicators = match kind {
                ChartKind::Indicators => Some(compute_indicators(&series)),
                ChartKind::PriceVolume => None,
            };
            renderer.render(kind, &series, indicators.as_ref(), &title, period)
        })
        .await;

        let bytes = match rendered {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %key, "Renderer produced no image");
                return Ok(None);
            }
            Err(e) => {
                error!(key = %key, error = %e, "Chart render task failed");
                return Ok(None);
            }
        };

        if let Err(e) = self.cache.put_raw(&key, bytes.clone()).await {
            warn!(key = %key, error = %e, "Chart cache write failed");
        }
        debug!(key = %key, size = bytes.len(), "Chart rendered");
        Ok(Some(bytes))
    }
}
