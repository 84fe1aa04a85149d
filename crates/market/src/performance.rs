use crate::history::HistoryCache;
use kabu_core::cache::port::{Cache, CacheExt};
use kabu_core::common::{HistoryWindow, normalize_symbol};
use kabu_core::market::entity::PriceSeries;
use kabu_core::market::error::MarketError;
use kabu_core::performance::entity::{
    Direction, Period, PerformanceRecord, RankedEntry, RankedList, StockPerformance,
};
use kabu_core::universe::port::UniverseProvider;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// 默认并发抓取数。
pub const DEFAULT_MAX_WORKERS: usize = 8;
/// 默认参与排行的标的数量（标的池前 N 个）。
pub const DEFAULT_UNIVERSE_SIZE: usize = 50;

/// 保留两位小数。
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// # Summary
/// 百分比涨跌幅。
///
/// # Returns
/// `round(((last - first) / first) * 100, 2)`；`first <= 0` 时为 `None`。
pub fn pct_change(first: f64, last: f64) -> Option<f64> {
    if first <= 0.0 {
        return None;
    }
    Some(round2(((last - first) / first) * 100.0))
}

/// # Summary
/// 计算单个序列在所有周期下的涨跌幅。
///
/// # Logic
/// 使用复权收盘价，末根与基准根比较；K 线不足的周期记为 `None`。
pub fn compute_performance(series: &PriceSeries) -> PerformanceRecord {
    let closes = series.adjusted_closes();
    let n = closes.len();
    let mut changes = BTreeMap::new();

    if let Some(&last) = closes.last() {
        for period in Period::ALL {
            let base = match period.offset_from_end() {
                Some(offset) if n >= offset => closes.get(n - offset).copied(),
                Some(_) => None,
                None => closes.first().copied(),
            };
            changes.insert(period, base.and_then(|first| pct_change(first, last)));
        }
    }

    PerformanceRecord {
        symbol: series.symbol().to_string(),
        changes,
    }
}

/// # Summary
/// 按方向排序并截断。
///
/// # Invariants
/// - 主键为涨跌幅（best 降序，worst 升序），次键为代码升序，结果完全确定。
pub fn rank(
    records: &[PerformanceRecord],
    direction: Direction,
    period: Period,
    limit: usize,
) -> RankedList {
    let mut entries: Vec<RankedEntry> = records
        .iter()
        .filter_map(|r| {
            r.change(period).map(|change| RankedEntry {
                symbol: r.symbol.clone(),
                change,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        let primary = match direction {
            Direction::Best => b.change.total_cmp(&a.change),
            Direction::Worst => a.change.total_cmp(&b.change),
        };
        match primary {
            Ordering::Equal => a.symbol.cmp(&b.symbol),
            other => other,
        }
    });
    entries.truncate(limit);
    entries
}

/// # Summary
/// 涨跌幅排行引擎，带结果缓存。
///
/// # Invariants
/// - 并发回源数不超过 `max_workers`。
/// - 单个标的失败只记录警告并被排除，不影响整体结果。
pub struct PerformanceEngine {
    history: Arc<HistoryCache>,
    results: Arc<dyn Cache>,
    universe: Arc<dyn UniverseProvider>,
    max_workers: usize,
    universe_size: usize,
}

impl PerformanceEngine {
    pub fn new(
        history: Arc<HistoryCache>,
        results: Arc<dyn Cache>,
        universe: Arc<dyn UniverseProvider>,
    ) -> Self {
        Self {
            history,
            results,
            universe,
            max_workers: DEFAULT_MAX_WORKERS,
            universe_size: DEFAULT_UNIVERSE_SIZE,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_universe_size(mut self, universe_size: usize) -> Self {
        self.universe_size = universe_size;
        self
    }

    fn result_key(direction: Direction, period: Period, limit: usize) -> String {
        format!("{}:{}:{}", direction, period, limit)
    }

    /// # Summary
    /// 并发抓取整个标的池并计算各自的表现。
    ///
    /// # Logic
    /// 1. 取标的池前 `universe_size` 个代码；加载失败时视为空池。
    /// 2. 每个代码一个任务，由信号量限制并发。
    /// 3. 按完成顺序收集结果，失败的代码记录警告后跳过。
    async fn fetch_universe(&self) -> Vec<PerformanceRecord> {
        let symbols = match self.universe.symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(error = %e, "Universe unavailable, ranking empty set");
                return Vec::new();
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();

        for symbol in symbols.into_iter().take(self.universe_size) {
            let history = self.history.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => history
                        .get_history(&symbol, HistoryWindow::RANKING)
                        .await
                        .map(|series| compute_performance(&series)),
                    Err(e) => Err(MarketError::Upstream(e.to_string())),
                };
                (symbol, result)
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(record))) => records.push(record),
                Ok((symbol, Err(e))) => warn!(symbol = %symbol, error = %e, "Symbol excluded from ranking"),
                Err(e) => warn!(error = %e, "Ranking task aborted"),
            }
        }
        records
    }

    /// # Summary
    /// 获取指定方向与周期的涨跌幅排行。
    ///
    /// # Logic
    /// 1. 查结果缓存，命中直接返回。
    /// 2. 未命中则并发抓取标的池，过滤、排序、截断。
    /// 3. 写入结果缓存后返回。
    ///
    /// # Arguments
    /// * `direction`: best 或 worst。
    /// * `period`: 统计周期。
    /// * `limit`: 返回条目上限，为 0 时直接返回空列表。
    ///
    /// # Returns
    /// 长度不超过 `limit` 的有序列表，可能为空。
    pub async fn rank_performers(
        &self,
        direction: Direction,
        period: Period,
        limit: usize,
    ) -> RankedList {
        if limit == 0 {
            return Vec::new();
        }

        let key = Self::result_key(direction, period, limit);
        match self.results.get::<RankedList>(&key).await {
            Ok(Some(cached)) => {
                debug!(key = %key, "Ranking served from cache");
                return cached;
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Result cache read failed, treating as miss"),
        }

        let records = self.fetch_universe().await;
        let ranked = rank(&records, direction, period, limit);
        info!(key = %key, candidates = records.len(), returned = ranked.len(), "Ranking computed");

        if let Err(e) = self.results.put(&key, &ranked).await {
            warn!(key = %key, error = %e, "Result cache write failed");
        }
        ranked
    }

    /// # Summary
    /// 单只证券的最新价与各周期表现。
    ///
    /// # Returns
    /// 历史数据获取失败时原样返回错误。
    pub async fn stock_performance(&self, symbol: &str) -> Result<StockPerformance, MarketError> {
        let symbol = normalize_symbol(symbol);
        let series = self
            .history
            .get_history(&symbol, HistoryWindow::RANKING)
            .await?;
        let current_price = series
            .last()
            .map(|c| round2(c.adjusted_close()))
            .ok_or(MarketError::InsufficientData {
                needed: PriceSeries::MIN_BARS,
                got: 0,
            })?;

        Ok(StockPerformance {
            symbol,
            current_price,
            record: compute_performance(&series),
        })
    }
}
