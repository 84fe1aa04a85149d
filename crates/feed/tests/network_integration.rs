use kabu_core::common::{HistoryRange, HistoryWindow, Stock, TimeFrame};
use kabu_core::market::error::MarketError;
use kabu_core::market::port::MarketDataProvider;
use kabu_core::universe::port::UniverseSource;
use kabu_feed::wikipedia::WikipediaUniverseSource;
use kabu_feed::yahoo::YahooProvider;
use std::time::Duration;

const YAHOO: &str = "https://query1.finance.yahoo.com";
const SP500: &str = "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";

fn install_crypto() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();
}

/// # Summary
/// 雅虎财经日线抓取的集成测试（需要网络）。
///
/// # Logic
/// 1. 初始化 YahooProvider。
/// 2. 抓取 AAPL 排行窗口（1y × 1d）的数据。
/// 3. 断言数据足够且按时间递增。
#[tokio::test]
#[ignore = "requires network access"]
async fn test_yahoo_real_fetch() -> anyhow::Result<()> {
    install_crypto();
    let provider = YahooProvider::new(YAHOO, Duration::from_secs(10))?;

    let candles = provider
        .fetch_candles(&Stock::new("aapl"), HistoryWindow::RANKING)
        .await?;

    assert!(candles.len() > 200, "got {} bars", candles.len());
    assert!(candles.windows(2).all(|w| w[0].time < w[1].time));
    assert!(candles.iter().any(|c| c.adj_close.is_some()));
    Ok(())
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_yahoo_intraday_fetch() -> anyhow::Result<()> {
    install_crypto();
    let provider = YahooProvider::new(YAHOO, Duration::from_secs(10))?;
    let window = HistoryWindow::new(HistoryRange::Day7, TimeFrame::Hour1);

    let candles = provider.fetch_candles(&Stock::new("MSFT"), window).await?;
    assert!(!candles.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_yahoo_unknown_symbol() -> anyhow::Result<()> {
    install_crypto();
    let provider = YahooProvider::new(YAHOO, Duration::from_secs(10))?;

    let result = provider
        .fetch_candles(&Stock::new("ZZZZNOTREAL"), HistoryWindow::RANKING)
        .await;
    assert!(matches!(result, Err(MarketError::NotFound(_))), "{:?}", result);
    Ok(())
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_wikipedia_constituents() -> anyhow::Result<()> {
    install_crypto();
    let source = WikipediaUniverseSource::new(SP500, Duration::from_secs(15))?;

    let symbols = source.fetch_symbols().await?;
    assert!(symbols.len() > 400);
    assert!(symbols.iter().any(|s| s == "AAPL"));
    assert!(symbols.iter().all(|s| !s.contains('.')));
    Ok(())
}
