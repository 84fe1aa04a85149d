//! 供下游 crate 测试使用的模拟端口实现。

use crate::chart::entity::{ChartKind, ChartPeriod};
use crate::chart::port::ChartRenderer;
use crate::common::{HistoryWindow, Stock};
use crate::indicator::entity::IndicatorSeries;
use crate::market::entity::{Candle, PriceSeries};
use crate::market::error::MarketError;
use crate::market::port::MarketDataProvider;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 以固定起点按日生成 K 线，开高低收取同一收盘价附近的值。
pub fn daily_candles(closes: &[f64]) -> Vec<Candle> {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 2, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    closes
        .iter()
        .zip(0i64..)
        .map(|(&close, day)| Candle {
            time: start + Duration::days(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            adj_close: None,
            volume: 1_000.0,
        })
        .collect()
}

/// # Summary
/// 可编排的行情数据源：按代码预设响应，并统计调用次数。
///
/// # Invariants
/// - 未预设的代码返回 `default` 响应。
pub struct MockProvider {
    responses: DashMap<String, Result<Vec<Candle>, MarketError>>,
    default: Result<Vec<Candle>, MarketError>,
    calls: AtomicUsize,
    per_symbol: DashMap<String, usize>,
    delay: std::time::Duration,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: DashMap::new(),
            default: Err(MarketError::NotFound("unscripted".into())),
            calls: AtomicUsize::new(0),
            per_symbol: DashMap::new(),
            delay: std::time::Duration::ZERO,
        }
    }

    /// 所有未预设代码都返回该收盘价序列。
    pub fn with_default_closes(mut self, closes: &[f64]) -> Self {
        self.default = Ok(daily_candles(closes));
        self
    }

    /// 每次调用前等待指定时长（依赖 tokio 时钟，可被暂停）。
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_closes(self, symbol: &str, closes: &[f64]) -> Self {
        self.responses
            .insert(symbol.to_string(), Ok(daily_candles(closes)));
        self
    }

    pub fn with_error(self, symbol: &str, error: MarketError) -> Self {
        self.responses.insert(symbol.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, symbol: &str) -> usize {
        self.per_symbol.get(symbol).map(|c| *c).unwrap_or(0)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch_candles(
        &self,
        stock: &Stock,
        _window: HistoryWindow,
    ) -> Result<Vec<Candle>, MarketError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.per_symbol.entry(stock.symbol.clone()).or_insert(0) += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.responses.get(&stock.symbol) {
            Some(r) => r.value().clone(),
            None => self.default.clone(),
        }
    }
}

/// # Summary
/// 统计调用次数的渲染器，输出内容为 `kind:symbol:period:bars`。
pub struct CountingRenderer {
    calls: AtomicUsize,
    produce: AtomicBool,
}

impl CountingRenderer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            produce: AtomicBool::new(true),
        }
    }

    /// 后续调用一律返回 `None`（`false`）或正常出图（`true`）。
    pub fn set_produce(&self, produce: bool) {
        self.produce.store(produce, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for CountingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer for CountingRenderer {
    fn render(
        &self,
        kind: ChartKind,
        series: &PriceSeries,
        indicators: Option<&IndicatorSeries>,
        symbol: &str,
        period: ChartPeriod,
    ) -> Option<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.produce.load(Ordering::SeqCst) {
            return None;
        }
        let with_indicators = indicators.is_some_and(|i| i.len() == series.len());
        Some(
            format!(
                "{}:{}:{}:{}:{}",
                kind,
                symbol,
                period,
                series.len(),
                with_indicators
            )
            .into_bytes(),
        )
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }
}
