use async_trait::async_trait;
use kabu_core::universe::error::UniverseError;
use kabu_core::universe::port::UniverseSource;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::info;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 成分股表格中每一行的选择器。
const ROW_SELECTOR: &str = "table#constituents tbody tr";

/// # Summary
/// 从 Wikipedia "List of S&P 500 companies" 页面抓取成分股代码。
///
/// # Invariants
/// - 仅读取 `constituents` 表格每行第一个单元格。
/// - 输出代码已去除 `$`、`^`、`.` 并转为大写。
pub struct WikipediaUniverseSource {
    client: Client,
    url: String,
}

impl WikipediaUniverseSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, UniverseError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UniverseError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

/// 规范化表格中的代码文本。
fn clean_symbol(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '^' | '.'))
        .collect::<String>()
        .to_uppercase()
}

/// # Summary
/// 解析成分股页面 HTML。
///
/// # Logic
/// 1. 选中 `table#constituents` 的每一行。
/// 2. 取第一个 `td` 的文本（表头行没有 `td`，自然跳过）。
/// 3. 规范化并丢弃空值。
fn parse_constituents(html: &str) -> Result<Vec<String>, UniverseError> {
    let document = Html::parse_document(html);
    let row_selector =
        Selector::parse(ROW_SELECTOR).map_err(|e| UniverseError::Parse(e.to_string()))?;
    let td_selector = Selector::parse("td").map_err(|e| UniverseError::Parse(e.to_string()))?;

    let symbols: Vec<String> = document
        .select(&row_selector)
        .filter_map(|tr| tr.select(&td_selector).next())
        .map(|td| clean_symbol(&td.text().collect::<String>()))
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(UniverseError::Empty);
    }
    Ok(symbols)
}

#[async_trait]
impl UniverseSource for WikipediaUniverseSource {
    async fn fetch_symbols(&self) -> Result<Vec<String>, UniverseError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| UniverseError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(UniverseError::Network(format!("HTTP {}", resp.status())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| UniverseError::Network(e.to_string()))?;

        let symbols = parse_constituents(&body)?;
        info!(count = symbols.len(), "Fetched S&P 500 constituents");
        Ok(symbols)
    }
}
