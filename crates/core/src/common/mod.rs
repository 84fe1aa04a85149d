pub mod time;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 证券标的实体，代表系统关注的特定股票。
///
/// # Invariants
/// - `symbol` 必须是大写的交易代码。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Stock {
    // 股票代码 (例如: AAPL)
    pub symbol: String,
    // 交易所代码 (可选，例如: NASDAQ)
    pub exchange: Option<String>,
}

impl Stock {
    /// 以规范化后的代码构造标的 (去除空白并转为大写)。
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            exchange: None,
        }
    }
}

/// 规范化用户输入的证券代码。
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// # Summary
/// K 线时间周期枚举，定义单根 K 线的时间跨度。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    // 5分钟
    Minute5,
    // 1小时
    Hour1,
    // 1日
    Day1,
    // 1周
    Week1,
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "5m" | "minute5" => Ok(TimeFrame::Minute5),
            "1h" | "60m" | "hour1" => Ok(TimeFrame::Hour1),
            "1d" | "day1" => Ok(TimeFrame::Day1),
            "1wk" | "week1" => Ok(TimeFrame::Week1),
            _ => Err(format!("Unknown TimeFrame: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFrame::Minute5 => write!(f, "5m"),
            TimeFrame::Hour1 => write!(f, "1h"),
            TimeFrame::Day1 => write!(f, "1d"),
            TimeFrame::Week1 => write!(f, "1wk"),
        }
    }
}

/// # Summary
/// 历史数据回溯范围。
///
/// # Invariants
/// - 范围以数据源的自然日历跨度计算，不保证 K 线数量。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HistoryRange {
    // 最近一个交易日
    Day1,
    // 7 天
    Day7,
    // 1 个月
    Month1,
    // 3 个月
    Month3,
    // 1 年
    Year1,
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryRange::Day1 => write!(f, "1d"),
            HistoryRange::Day7 => write!(f, "7d"),
            HistoryRange::Month1 => write!(f, "1mo"),
            HistoryRange::Month3 => write!(f, "3mo"),
            HistoryRange::Year1 => write!(f, "1y"),
        }
    }
}

/// # Summary
/// 一次历史数据请求的窗口：回溯范围 + K 线周期。
///
/// # Invariants
/// - 同一 (symbol, window) 组合在历史缓存中只对应一个条目。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct HistoryWindow {
    pub range: HistoryRange,
    pub timeframe: TimeFrame,
}

impl HistoryWindow {
    /// 涨跌幅排行使用的窗口：1 年日线。
    pub const RANKING: HistoryWindow = HistoryWindow {
        range: HistoryRange::Year1,
        timeframe: TimeFrame::Day1,
    };

    pub const fn new(range: HistoryRange, timeframe: TimeFrame) -> Self {
        Self { range, timeframe }
    }
}

impl std::fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.range, self.timeframe)
    }
}
