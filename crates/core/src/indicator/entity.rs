use serde::{Deserialize, Serialize};

/// # Summary
/// 与价格序列逐根对齐的技术指标序列。
///
/// # Invariants
/// - 所有向量长度等于源序列长度。
/// - 窗口未满的位置为 `None`，而不是 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    // RSI-14
    pub rsi: Vec<Option<f64>>,
    // EMA-12 与 EMA-26 之差
    pub macd: Vec<f64>,
    // MACD 的 EMA-9
    pub macd_signal: Vec<f64>,
    // MACD 与信号线之差
    pub macd_histogram: Vec<f64>,
    // ATR-14
    pub atr: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.macd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd.is_empty()
    }
}
