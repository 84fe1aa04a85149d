use crate::market::error::MarketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 单根 K 线数据实体，记录特定时段内的行情波动。
///
/// # Invariants
/// - `high` 必须大于或等于 `low`, `open`, `close`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // K 线开始时间
    pub time: DateTime<Utc>,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 调整后收盘价 (用于处理分红、拆股等复权情况)
    pub adj_close: Option<f64>,
    // 成交量
    pub volume: f64,
}

impl Candle {
    /// 复权收盘价，数据源未提供时退化为原始收盘价。
    pub fn adjusted_close(&self) -> f64 {
        self.adj_close.unwrap_or(self.close)
    }
}

/// # Summary
/// 单只证券在某个历史窗口内的有序 K 线序列。
///
/// # Invariants
/// - 时间戳严格递增，无重复。
/// - 至少包含 `PriceSeries::MIN_BARS` 根 K 线。
/// - 构造后不可变，刷新时整体替换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl PriceSeries {
    /// 任何派生计算所需的最少 K 线数量。
    pub const MIN_BARS: usize = 2;

    /// # Summary
    /// 从原始 K 线构造序列。
    ///
    /// # Logic
    /// 1. 按时间升序排序。
    /// 2. 相同时间戳仅保留最后一根。
    /// 3. 不足 `MIN_BARS` 时返回 `InsufficientData`。
    ///
    /// # Arguments
    /// * `symbol`: 证券代码。
    /// * `candles`: 数据源返回的原始 K 线。
    ///
    /// # Returns
    /// 满足不变量的序列，或 `MarketError::InsufficientData`。
    pub fn new(symbol: impl Into<String>, mut candles: Vec<Candle>) -> Result<Self, MarketError> {
        candles.sort_by_key(|c| c.time);
        let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match deduped.last_mut() {
                Some(prev) if prev.time == candle.time => *prev = candle,
                _ => deduped.push(candle),
            }
        }

        if deduped.len() < Self::MIN_BARS {
            return Err(MarketError::InsufficientData {
                needed: Self::MIN_BARS,
                got: deduped.len(),
            });
        }

        Ok(Self {
            symbol: symbol.into(),
            candles: deduped,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// 序列恒非空，仅为满足惯用 API。
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// 原始收盘价序列。
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// 复权收盘价序列，用于涨跌幅计算。
    pub fn adjusted_closes(&self) -> Vec<f64> {
        self.candles.iter().map(Candle::adjusted_close).collect()
    }
}
