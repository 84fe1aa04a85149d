//! 面向用户的消息文本。

use kabu_core::chart::entity::{ChartKind, ChartPeriod};
use kabu_core::performance::entity::{Direction, Period, RankedEntry, StockPerformance};

pub const WELCOME: &str =
    "📊 Stock Advisor Bot\n\nWelcome! Use the buttons to explore the market.\n⚠️ Not financial advice.";
pub const MENU: &str = "📊 Stock Advisor Bot\n\nSelect an option:";
pub const SEARCH_PROMPT: &str = "🔍 Stock Search\n\nEnter a stock symbol:";
pub const CHART_FAILED: &str = "❌ Could not generate chart. Please try again.";

/// 排行菜单中的周期名称。
pub fn period_label(period: Period) -> &'static str {
    match period {
        Period::Hour24 => "Today",
        Period::Day7 => "7 Days",
        Period::Day30 => "30 Days",
        Period::Month3 => "3 Months",
        Period::Year1 => "1 Year",
    }
}

/// 个股摘要中的周期名称。
pub fn period_long_label(period: Period) -> &'static str {
    match period {
        Period::Hour24 => "24 Hours",
        other => period_label(other),
    }
}

pub fn chart_kind_label(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::PriceVolume => "Price & Volume",
        ChartKind::Indicators => "RSI, MACD, ATR",
    }
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Best => "Best",
        Direction::Worst => "Worst",
    }
}

/// # Summary
/// 带符号的涨跌幅文本。
///
/// # Logic
/// 整数值保留一位小数（`+10.0`），其余按最短表示输出（`-0.98`）。
pub fn signed_change(change: f64) -> String {
    if change.fract() == 0.0 {
        format!("{:+.1}", change)
    } else {
        format!("{:+}", change)
    }
}

fn change_icon(change: f64) -> &'static str {
    if change >= 0.0 { "🟢" } else { "🔴" }
}

pub fn direction_prompt(direction: Direction) -> String {
    format!(
        "📈 {} Performers\n\nSelect timeframe:",
        direction_label(direction)
    )
}

pub fn limit_prompt(direction: Direction, period: Period) -> String {
    format!(
        "📈 {} Performers - {}\n\nHow many stocks to show?",
        direction_label(direction),
        period_label(period)
    )
}

pub fn ranking_progress(period: Period) -> String {
    format!("⚡ Fetching {} performers", period_label(period))
}

pub fn no_data(period: Period) -> String {
    format!("❌ No data available for {} period.", period_label(period))
}

/// # Summary
/// 排行结果文本。
///
/// # Logic
/// 标题行后逐行输出 `{序号}. {图标} {代码}: {涨跌幅}%`。
pub fn ranking(direction: Direction, period: Period, limit: usize, entries: &[RankedEntry]) -> String {
    let title = match direction {
        Direction::Best => "📈 Top",
        Direction::Worst => "📉 Bottom",
    };
    let lines: Vec<String> = entries
        .iter()
        .zip(1..)
        .map(|(e, rank): (&RankedEntry, usize)| {
            format!(
                "{}. {} {}: {}%",
                rank,
                change_icon(e.change),
                e.symbol,
                signed_change(e.change)
            )
        })
        .collect();
    format!(
        "{} {} Performers ({})\n\n{}",
        title,
        limit,
        period_label(period),
        lines.join("\n")
    )
}

/// # Summary
/// 个股摘要（HTML 模式）。
pub fn stock_summary(perf: &StockPerformance) -> String {
    let mut lines = vec![format!("<b>{}</b>", escape_html(&perf.symbol))];
    if perf.current_price != 0.0 {
        lines.push(format!("Current Price: ${:.2}", perf.current_price));
    }
    lines.push(String::new());

    for period in Period::ALL {
        let label = period_long_label(period);
        match perf.record.change(period) {
            Some(change) => lines.push(format!(
                "{} {}: {}%",
                change_icon(change),
                label,
                signed_change(change)
            )),
            None => lines.push(format!("⭕ {}: No data", label)),
        }
    }
    lines.join("\n")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn not_found(symbol: &str) -> String {
    format!("❌ Could not find data for {}", symbol)
}

pub fn not_in_universe(symbol: &str) -> String {
    format!(
        "❌ {} not found in S&P 500. Try symbols like AAPL, MSFT, TSLA.",
        symbol
    )
}

pub fn chart_select(symbol: &str, kind: ChartKind) -> String {
    format!(
        "📊 {} - {}\n\nSelect timeframe:",
        symbol,
        chart_kind_label(kind)
    )
}

pub fn chart_loading(symbol: &str, kind: ChartKind, period: ChartPeriod) -> String {
    format!(
        "📈 Generating {} chart for {} ({})...",
        kind,
        symbol,
        period.as_str().to_uppercase()
    )
}

pub fn chart_caption(symbol: &str, kind: ChartKind, period: ChartPeriod) -> String {
    format!(
        "{} - {} ({})",
        symbol,
        chart_kind_label(kind),
        period.as_str().to_uppercase()
    )
}
