use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use kabu_core::common::{HistoryRange, HistoryWindow, Stock, TimeFrame};
use kabu_core::market::entity::Candle;
use kabu_core::market::error::MarketError;
use kabu_core::market::port::MarketDataProvider;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// # Summary
/// Yahoo Finance 行情提供者实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯。
/// - 不做限流与重试，调用方负责节流。
#[derive(Clone)]
pub struct YahooProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
    /// API 根地址，测试时可替换
    base_url: String,
}

impl YahooProvider {
    /// # Summary
    /// 创建一个新的 YahooProvider 实例。
    ///
    /// # Logic
    /// 1. 配置请求超时。
    /// 2. 设置伪装浏览器 User-Agent 以减少被拦截风险。
    /// 3. 初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `base_url`: API 根地址，例如 `https://query1.finance.yahoo.com`。
    /// * `timeout`: 单次请求超时。
    ///
    /// # Returns
    /// 返回初始化后的 YahooProvider，客户端构建失败时返回 `MarketError::Upstream`。
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketError::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Yahoo 识别的 interval 参数。
fn interval_param(timeframe: TimeFrame) -> &'static str {
    match timeframe {
        TimeFrame::Minute5 => "5m",
        TimeFrame::Hour1 => "60m",
        TimeFrame::Day1 => "1d",
        TimeFrame::Week1 => "1wk",
    }
}

/// Yahoo 识别的 range 参数。
fn range_param(range: HistoryRange) -> &'static str {
    match range {
        HistoryRange::Day1 => "1d",
        HistoryRange::Day7 => "7d",
        HistoryRange::Month1 => "1mo",
        HistoryRange::Month3 => "3mo",
        HistoryRange::Year1 => "1y",
    }
}

/// # Summary
/// Yahoo API 响应顶层结构。
///
/// # Invariants
/// - 映射自 Yahoo v8 chart 接口。
#[derive(Deserialize, Debug)]
struct YahooResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct YahooError {
    code: Option<String>,
    description: String,
}

/// # Summary
/// Yahoo API 单个时间序列结果。
///
/// # Invariants
/// - 无成交的时段 Yahoo 会省略 `timestamp` 字段。
#[derive(Deserialize, Debug)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Deserialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    // 调整后的价格数据
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Deserialize, Debug)]
struct YahooAdjClose {
    adjclose: Vec<Option<f64>>,
}

/// # Summary
/// Yahoo API 原始报价数据，各字段按下标与 `timestamp` 对齐。
#[derive(Deserialize, Debug, Default)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// # Summary
/// 将 Yahoo chart 响应转换为 K 线列表。
///
/// # Logic
/// 1. `chart.error` 为 "Not Found" 时映射为 `NotFound`，其余错误映射为 `Upstream`。
/// 2. 缺失 `result` 视为标的不存在。
/// 3. 丢弃任一 OHLCV 字段为空的行，合并 adjclose。
fn parse_chart(symbol: &str, response: YahooResponse) -> Result<Vec<Candle>, MarketError> {
    if let Some(err) = response.chart.error {
        return match err.code.as_deref() {
            Some("Not Found") => Err(MarketError::NotFound(symbol.to_string())),
            _ => Err(MarketError::Upstream(err.description)),
        };
    }

    let result = response
        .chart
        .result
        .and_then(|mut r| r.pop())
        .ok_or_else(|| MarketError::NotFound(symbol.to_string()))?;

    let Some(quote) = result.indicators.quote.first() else {
        return Ok(Vec::new());
    };

    let adj_close_list = result
        .indicators
        .adjclose
        .as_ref()
        .and_then(|v| v.first())
        .map(|v| &v.adjclose);

    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
            Utc.timestamp_opt(ts, 0).single(),
        );
        if let (Some(open), Some(high), Some(low), Some(close), Some(volume), Some(time)) = row {
            let adj_close = adj_close_list
                .and_then(|list| list.get(i))
                .copied()
                .flatten();
            candles.push(Candle {
                time,
                open,
                high,
                low,
                close,
                adj_close,
                volume,
            });
        }
    }

    Ok(candles)
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    /// # Summary
    /// 从 Yahoo Finance 抓取 K 线历史数据。
    ///
    /// # Logic
    /// 1. 将窗口映射为 Yahoo 的 range / interval。
    /// 2. 发起异步请求；404 映射为 `NotFound`，其他非 2xx 映射为 `Upstream`。
    /// 3. 解析嵌套的 JSON 数据。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        window: HistoryWindow,
    ) -> Result<Vec<Candle>, MarketError> {
        let symbol = &stock.symbol;
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("range", range_param(window.range)),
                ("interval", interval_param(window.timeframe)),
                ("includeAdjustedClose", "true"),
                ("events", "div,splits"),
            ])
            .send()
            .await
            .map_err(|e| MarketError::Upstream(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MarketError::NotFound(symbol.clone()));
        }
        if !status.is_success() {
            return Err(MarketError::Upstream(format!("HTTP {}", status)));
        }

        let json: YahooResponse = resp
            .json()
            .await
            .map_err(|e| MarketError::Upstream(e.to_string()))?;

        let candles = parse_chart(symbol, json)?;
        debug!(symbol = %symbol, window = %window, rows = candles.len(), "Yahoo chart fetched");
        Ok(candles)
    }
}
