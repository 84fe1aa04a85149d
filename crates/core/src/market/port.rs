use crate::common::{HistoryWindow, Stock};
use crate::market::entity::Candle;
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 市场行情数据提供者接口（原始数据源）。
///
/// # Invariants
/// - 数据源被视为不可靠的：可能限流、报错或返回空数据。
/// - 实现者不负责限流与缓存，这两项由历史缓存层统一处理。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取特定证券在指定窗口内的 K 线数据。
    ///
    /// # Logic
    /// 1. 将窗口映射为数据源识别的 range / interval。
    /// 2. 执行网络请求并解析响应数据。
    /// 3. 丢弃任一 OHLCV 字段缺失的行。
    ///
    /// # Arguments
    /// * `stock`: 证券身份。
    /// * `window`: 回溯范围与 K 线周期。
    ///
    /// # Returns
    /// 成功返回 K 线列表（可能为空），失败返回 `MarketError`。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        window: HistoryWindow,
    ) -> Result<Vec<Candle>, MarketError>;
}
