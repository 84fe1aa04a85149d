use crate::universe::error::UniverseError;
use async_trait::async_trait;

/// # Summary
/// 标的池提供者接口，返回稳定有序的证券代码列表（例如指数成分股）。
///
/// # Invariants
/// - 多次调用返回相同的顺序。
/// - 代码已规范化，不含 `$` 等修饰字符。
#[async_trait]
pub trait UniverseProvider: Send + Sync {
    /// # Summary
    /// 获取完整的标的池。
    ///
    /// # Returns
    /// 成功返回有序代码列表，失败返回 `UniverseError`。
    async fn symbols(&self) -> Result<Vec<String>, UniverseError>;
}

/// # Summary
/// 远端成分股表格数据源，仅在本地快照缺失时使用。
#[async_trait]
pub trait UniverseSource: Send + Sync {
    /// 从远端抓取成分股代码列表。
    async fn fetch_symbols(&self) -> Result<Vec<String>, UniverseError>;
}
