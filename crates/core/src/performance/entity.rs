use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// # Summary
/// 涨跌幅统计周期。
///
/// # Invariants
/// - 周期按“末端对齐”的日线计算：末根 K 线与向前第 N 根比较。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    #[serde(rename = "24h")]
    Hour24,
    #[serde(rename = "7d")]
    Day7,
    #[serde(rename = "30d")]
    Day30,
    #[serde(rename = "3mo")]
    Month3,
    #[serde(rename = "1y")]
    Year1,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Hour24,
        Period::Day7,
        Period::Day30,
        Period::Month3,
        Period::Year1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Hour24 => "24h",
            Period::Day7 => "7d",
            Period::Day30 => "30d",
            Period::Month3 => "3mo",
            Period::Year1 => "1y",
        }
    }

    /// # Summary
    /// 基准 K 线相对末尾的偏移量。
    ///
    /// # Returns
    /// `Some(n)` 表示与倒数第 n 根比较（需要至少 n 根）；
    /// `None` 表示与序列首根比较。
    pub fn offset_from_end(&self) -> Option<usize> {
        match self {
            Period::Hour24 => Some(2),
            Period::Day7 => Some(5),
            Period::Day30 => Some(22),
            Period::Month3 => Some(66),
            Period::Year1 => None,
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Period::Hour24),
            "7d" => Ok(Period::Day7),
            "30d" => Ok(Period::Day30),
            "3mo" => Ok(Period::Month3),
            "1y" => Ok(Period::Year1),
            _ => Err(format!("Unknown Period: {}", s)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 排行方向。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "worst")]
    Worst,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Best => "best",
            Direction::Worst => "worst",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best" => Ok(Direction::Best),
            "worst" => Ok(Direction::Worst),
            _ => Err(format!("Unknown Direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Summary
/// 单只证券在各周期下的涨跌幅。
///
/// # Invariants
/// - 每个周期都有条目；数据不足的周期为 `None`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub symbol: String,
    pub changes: BTreeMap<Period, Option<f64>>,
}

impl PerformanceRecord {
    /// 获取指定周期的涨跌幅。
    pub fn change(&self, period: Period) -> Option<f64> {
        self.changes.get(&period).copied().flatten()
    }
}

/// 单只证券的行情摘要：最新价与各周期表现。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPerformance {
    pub symbol: String,
    pub current_price: f64,
    pub record: PerformanceRecord,
}

/// 排行榜中的单个条目。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub symbol: String,
    pub change: f64,
}

/// 排行榜：长度不超过请求上限，按方向排序。
pub type RankedList = Vec<RankedEntry>;
