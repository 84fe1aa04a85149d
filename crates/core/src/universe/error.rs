use thiserror::Error;

/// # Summary
/// 标的池加载错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum UniverseError {
    /// 本地快照读写失败
    #[error("Snapshot IO error: {0}")]
    Io(String),
    /// 快照或远端表格内容无法解析
    #[error("Parse error: {0}")]
    Parse(String),
    /// 远端数据源网络错误
    #[error("Network error: {0}")]
    Network(String),
    /// 加载结果为空
    #[error("Universe is empty")]
    Empty,
}
