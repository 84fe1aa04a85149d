use crate::chart::ChartCache;
use crate::history::HistoryCache;
use kabu_core::chart::entity::{ChartKind, ChartPeriod};
use kabu_core::common::HistoryWindow;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

/// 预渲染图表的代码数量上限。
const PRERENDER_SYMBOLS: usize = 3;
/// 预渲染的图表跨度。
const PRERENDER_PERIODS: [ChartPeriod; 3] = [ChartPeriod::Day1, ChartPeriod::Day7, ChartPeriod::Day30];

/// # Summary
/// 后台预热任务的句柄。
///
/// # Invariants
/// - 句柄被丢弃不会停止任务；需显式调用 `shutdown`。
pub struct WarmerHandle {
    handle: JoinHandle<()>,
}

impl WarmerHandle {
    /// 中止预热任务。已写入的缓存条目保持有效。
    pub fn shutdown(&self) {
        self.handle.abort();
    }

    /// 等待任务结束；被中止时返回取消错误。
    pub async fn join(self) -> Result<(), JoinError> {
        self.handle.await
    }
}

/// # Summary
/// 缓存预热器：启动后为热门代码预取排行窗口的历史数据，并可选预渲染价格图。
pub struct Warmer {
    history: Arc<HistoryCache>,
    charts: Option<Arc<ChartCache>>,
    popular: Vec<String>,
    chart_symbols: Vec<String>,
}

impl Warmer {
    pub fn new(history: Arc<HistoryCache>, popular: Vec<String>) -> Self {
        Self {
            history,
            charts: None,
            popular,
            chart_symbols: Vec::new(),
        }
    }

    /// 同时预渲染前三个代码在 1d / 7d / 30d 跨度下的价格图。
    pub fn with_charts(mut self, charts: Arc<ChartCache>, chart_symbols: Vec<String>) -> Self {
        self.charts = Some(charts);
        self.chart_symbols = chart_symbols;
        self
    }

    /// # Summary
    /// 依次预热，所有错误只记录日志。
    ///
    /// # Logic
    /// 1. 为每个热门代码拉取排行窗口的历史数据。
    /// 2. 若配置了图表缓存，逐个预渲染价格图。
    pub async fn run(&self) {
        info!(count = self.popular.len(), "Cache warming started");
        for symbol in &self.popular {
            match self.history.get_history(symbol, HistoryWindow::RANKING).await {
                Ok(series) => debug!(symbol = %symbol, bars = series.len(), "Warmed history"),
                Err(e) => warn!(symbol = %symbol, error = %e, "Warming history failed"),
            }
        }

        if let Some(charts) = &self.charts {
            for symbol in self.chart_symbols.iter().take(PRERENDER_SYMBOLS) {
                for period in PRERENDER_PERIODS {
                    match charts
                        .get_or_render(symbol, period, ChartKind::PriceVolume)
                        .await
                    {
                        Ok(Some(_)) => debug!(symbol = %symbol, period = %period, "Pre-rendered chart"),
                        Ok(None) => debug!(symbol = %symbol, period = %period, "Nothing to pre-render"),
                        Err(e) => warn!(symbol = %symbol, period = %period, error = %e, "Pre-render failed"),
                    }
                }
            }
        }
        info!("Cache warming finished");
    }

    /// 在后台启动预热，返回可中止的句柄。
    pub fn spawn(self) -> WarmerHandle {
        let handle = tokio::spawn(async move { self.run().await });
        WarmerHandle { handle }
    }
}
