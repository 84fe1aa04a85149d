use crate::common::{HistoryRange, HistoryWindow, TimeFrame};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 图表种类。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChartKind {
    // K 线 + 成交量
    #[serde(rename = "price")]
    PriceVolume,
    // RSI / MACD / ATR
    #[serde(rename = "indicators")]
    Indicators,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::PriceVolume => "price",
            ChartKind::Indicators => "indicators",
        }
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(ChartKind::PriceVolume),
            "indicators" => Ok(ChartKind::Indicators),
            _ => Err(format!("Unknown ChartKind: {}", s)),
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Summary
/// 图表时间跨度，每个跨度对应固定的历史窗口。
///
/// # Invariants
/// - 日内图使用 5 分钟线，7 天使用小时线，1 年使用周线，其余使用日线。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChartPeriod {
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "7d")]
    Day7,
    #[serde(rename = "30d")]
    Day30,
    #[serde(rename = "3mo")]
    Month3,
    #[serde(rename = "1y")]
    Year1,
}

impl ChartPeriod {
    pub const ALL: [ChartPeriod; 5] = [
        ChartPeriod::Day1,
        ChartPeriod::Day7,
        ChartPeriod::Day30,
        ChartPeriod::Month3,
        ChartPeriod::Year1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartPeriod::Day1 => "1d",
            ChartPeriod::Day7 => "7d",
            ChartPeriod::Day30 => "30d",
            ChartPeriod::Month3 => "3mo",
            ChartPeriod::Year1 => "1y",
        }
    }

    /// 该跨度对应的历史数据窗口。
    pub fn window(&self) -> HistoryWindow {
        match self {
            ChartPeriod::Day1 => HistoryWindow::new(HistoryRange::Day1, TimeFrame::Minute5),
            ChartPeriod::Day7 => HistoryWindow::new(HistoryRange::Day7, TimeFrame::Hour1),
            ChartPeriod::Day30 => HistoryWindow::new(HistoryRange::Month1, TimeFrame::Day1),
            ChartPeriod::Month3 => HistoryWindow::new(HistoryRange::Month3, TimeFrame::Day1),
            ChartPeriod::Year1 => HistoryWindow::new(HistoryRange::Year1, TimeFrame::Week1),
        }
    }
}

impl FromStr for ChartPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(ChartPeriod::Day1),
            "7d" => Ok(ChartPeriod::Day7),
            "30d" => Ok(ChartPeriod::Day30),
            "3mo" => Ok(ChartPeriod::Month3),
            "1y" => Ok(ChartPeriod::Year1),
            _ => Err(format!("Unknown ChartPeriod: {}", s)),
        }
    }
}

impl std::fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_period_windows() {
        assert_eq!(ChartPeriod::Day1.window().timeframe, TimeFrame::Minute5);
        assert_eq!(ChartPeriod::Day30.window().range, HistoryRange::Month1);
        assert_eq!(ChartPeriod::Year1.window().timeframe, TimeFrame::Week1);
    }

    #[test]
    fn test_chart_kind_parse() {
        assert_eq!("price".parse::<ChartKind>(), Ok(ChartKind::PriceVolume));
        assert_eq!("indicators".parse::<ChartKind>(), Ok(ChartKind::Indicators));
        assert!("candles".parse::<ChartKind>().is_err());
    }
}
