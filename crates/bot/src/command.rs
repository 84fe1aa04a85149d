use kabu_core::chart::entity::{ChartKind, ChartPeriod};
use kabu_core::common::normalize_symbol;
use kabu_core::performance::entity::{Direction, Period};

/// # Summary
/// 内联按钮回调数据的结构化表示。
///
/// # Invariants
/// - `parse(cb.data()) == Some(cb)` 对所有变体成立。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// `menu`
    Menu,
    /// `search`
    Search,
    /// `best` / `worst`
    Direction(Direction),
    /// `{dir}_{period}`
    Timeframe(Direction, Period),
    /// `{dir}_{period}_{limit}`
    Ranking(Direction, Period, usize),
    /// `chartselect:{kind}:{symbol}`
    ChartSelect(ChartKind, String),
    /// `chart:{kind}:{symbol}:{period}`
    Chart(ChartKind, String, ChartPeriod),
    /// `stock_back:{symbol}`
    StockBack(String),
}

impl Callback {
    /// # Summary
    /// 解析回调数据。
    ///
    /// # Returns
    /// 无法识别的数据返回 `None`，调用方应忽略。
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "menu" => return Some(Callback::Menu),
            "search" => return Some(Callback::Search),
            _ => {}
        }

        if let Some(rest) = data.strip_prefix("chartselect:") {
            let (kind, symbol) = rest.split_once(':')?;
            return Some(Callback::ChartSelect(kind.parse().ok()?, symbol_arg(symbol)?));
        }
        if let Some(rest) = data.strip_prefix("chart:") {
            let mut parts = rest.split(':');
            let (kind, symbol, period) = (parts.next()?, parts.next()?, parts.next()?);
            if parts.next().is_some() {
                return None;
            }
            return Some(Callback::Chart(
                kind.parse().ok()?,
                symbol_arg(symbol)?,
                period.parse().ok()?,
            ));
        }
        if let Some(symbol) = data.strip_prefix("stock_back:") {
            return Some(Callback::StockBack(symbol_arg(symbol)?));
        }

        let parts: Vec<&str> = data.split('_').collect();
        let direction: Direction = parts.first()?.parse().ok()?;
        match parts.as_slice() {
            [_] => Some(Callback::Direction(direction)),
            [_, period] => Some(Callback::Timeframe(direction, period.parse().ok()?)),
            [_, period, limit] => Some(Callback::Ranking(
                direction,
                period.parse().ok()?,
                limit.parse().ok()?,
            )),
            _ => None,
        }
    }

    /// 编码为回调数据。
    pub fn data(&self) -> String {
        match self {
            Callback::Menu => "menu".to_string(),
            Callback::Search => "search".to_string(),
            Callback::Direction(d) => d.to_string(),
            Callback::Timeframe(d, p) => format!("{}_{}", d, p),
            Callback::Ranking(d, p, limit) => format!("{}_{}_{}", d, p, limit),
            Callback::ChartSelect(kind, symbol) => format!("chartselect:{}:{}", kind, symbol),
            Callback::Chart(kind, symbol, period) => {
                format!("chart:{}:{}:{}", kind, symbol, period)
            }
            Callback::StockBack(symbol) => format!("stock_back:{}", symbol),
        }
    }
}

/// 回调中的代码参数：去除 `$` 并规范化，空值无效。
fn symbol_arg(raw: &str) -> Option<String> {
    let symbol = normalize_symbol(&raw.replace('$', ""));
    (!symbol.is_empty()).then_some(symbol)
}

/// 斜杠命令。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
}

impl Command {
    /// 解析 `/start` 或 `/start@BotName`，其余文本返回 `None`。
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" | "menu" => Some(Command::Start),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation() {
        assert_eq!(Callback::parse("menu"), Some(Callback::Menu));
        assert_eq!(Callback::parse("search"), Some(Callback::Search));
        assert_eq!(
            Callback::parse("worst"),
            Some(Callback::Direction(Direction::Worst))
        );
    }

    #[test]
    fn test_parse_ranking_flow() {
        assert_eq!(
            Callback::parse("best_24h"),
            Some(Callback::Timeframe(Direction::Best, Period::Hour24))
        );
        assert_eq!(
            Callback::parse("worst_3mo_20"),
            Some(Callback::Ranking(Direction::Worst, Period::Month3, 20))
        );
        assert_eq!(Callback::parse("best_2w"), None);
        assert_eq!(Callback::parse("best_7d_many"), None);
        assert_eq!(Callback::parse("best_7d_5_1"), None);
    }

    #[test]
    fn test_parse_chart_flow() {
        assert_eq!(
            Callback::parse("chartselect:indicators:$aapl"),
            Some(Callback::ChartSelect(ChartKind::Indicators, "AAPL".into()))
        );
        assert_eq!(
            Callback::parse("chart:price:TSLA:30d"),
            Some(Callback::Chart(
                ChartKind::PriceVolume,
                "TSLA".into(),
                ChartPeriod::Day30
            ))
        );
        assert_eq!(Callback::parse("chart:price:TSLA"), None);
        assert_eq!(Callback::parse("chart:price:TSLA:30d:x"), None);
        assert_eq!(
            Callback::parse("stock_back:NVDA"),
            Some(Callback::StockBack("NVDA".into()))
        );
        assert_eq!(Callback::parse("stock_back:"), None);
    }

    #[test]
    fn test_data_round_trips() {
        let all = [
            Callback::Menu,
            Callback::Search,
            Callback::Direction(Direction::Best),
            Callback::Timeframe(Direction::Worst, Period::Year1),
            Callback::Ranking(Direction::Best, Period::Day30, 10),
            Callback::ChartSelect(ChartKind::PriceVolume, "MSFT".into()),
            Callback::Chart(ChartKind::Indicators, "AMZN".into(), ChartPeriod::Day1),
            Callback::StockBack("GOOGL".into()),
        ];
        for cb in all {
            assert_eq!(Callback::parse(&cb.data()), Some(cb));
        }
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/start@kabu_bot now"), Some(Command::Start));
        assert_eq!(Command::parse("AAPL"), None);
        assert_eq!(Command::parse("/help"), None);
    }
}
