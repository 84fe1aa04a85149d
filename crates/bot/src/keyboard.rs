//! 内联键盘布局。

use crate::command::Callback;
use kabu_core::chart::entity::{ChartKind, ChartPeriod};
use kabu_core::notify::entity::{InlineButton, InlineKeyboard};
use kabu_core::performance::entity::{Direction, Period};

/// 排行条目数量选项。
pub const LIMIT_CHOICES: [usize; 3] = [5, 10, 20];

fn button(text: &str, callback: Callback) -> InlineButton {
    InlineButton::new(text, callback.data())
}

fn home() -> InlineButton {
    button("🏠 Home", Callback::Menu)
}

pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![button("📈 Best Performers", Callback::Direction(Direction::Best))],
        vec![button("📉 Worst Performers", Callback::Direction(Direction::Worst))],
        vec![button("🔍 Search and Charts", Callback::Search)],
    ])
}

pub fn search_prompt_menu() -> InlineKeyboard {
    InlineKeyboard::new(vec![vec![home()]])
}

/// # Summary
/// 个股结果下方的菜单。
///
/// # Arguments
/// * `has_chart` - 为 false 时不显示图表入口（出图失败后使用）。
pub fn stock_result_menu(symbol: &str, has_chart: bool) -> InlineKeyboard {
    let mut rows = Vec::new();
    if has_chart {
        rows.push(vec![
            button(
                "📊 Price and Vol",
                Callback::ChartSelect(ChartKind::PriceVolume, symbol.to_string()),
            ),
            button(
                "📈 RSI, MACD, ATR",
                Callback::ChartSelect(ChartKind::Indicators, symbol.to_string()),
            ),
        ]);
    }
    rows.push(vec![button("🔍 Search Another", Callback::Search), home()]);
    InlineKeyboard::new(rows)
}

pub fn chart_period_menu(symbol: &str, kind: ChartKind) -> InlineKeyboard {
    let chart = |label: &str, period: ChartPeriod| {
        button(label, Callback::Chart(kind, symbol.to_string(), period))
    };
    InlineKeyboard::new(vec![
        vec![
            chart("1D", ChartPeriod::Day1),
            chart("7D", ChartPeriod::Day7),
            chart("30D", ChartPeriod::Day30),
        ],
        vec![chart("3M", ChartPeriod::Month3), chart("1Y", ChartPeriod::Year1)],
        vec![
            button("◀️ Back", Callback::StockBack(symbol.to_string())),
            home(),
        ],
    ])
}

pub fn timeframe_menu(direction: Direction) -> InlineKeyboard {
    let tf = |label: &str, period: Period| button(label, Callback::Timeframe(direction, period));
    InlineKeyboard::new(vec![
        vec![
            tf("Today", Period::Hour24),
            tf("7d", Period::Day7),
            tf("30d", Period::Day30),
        ],
        vec![tf("3m", Period::Month3), tf("1y", Period::Year1)],
        vec![home()],
    ])
}

pub fn limit_menu(direction: Direction, period: Period) -> InlineKeyboard {
    let limit = |n: usize| {
        button(
            &format!("{} stocks", n),
            Callback::Ranking(direction, period, n),
        )
    };
    InlineKeyboard::new(vec![
        vec![limit(LIMIT_CHOICES[0]), limit(LIMIT_CHOICES[1])],
        vec![limit(LIMIT_CHOICES[2])],
        vec![button("⬅️ Back", Callback::Direction(direction)), home()],
    ])
}

pub fn results_menu(direction: Direction) -> InlineKeyboard {
    InlineKeyboard::new(vec![vec![
        button("🔄 Change Time", Callback::Direction(direction)),
        home(),
    ]])
}
