use thiserror::Error;

/// # Summary
/// 市场数据域错误枚举，处理上游故障、数据不足及标的缺失。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 批量扇出场景中此错误只记录日志，不向调用方传播。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    // 上游数据源不可达、返回错误或没有可用数据行
    #[error("Upstream error: {0}")]
    Upstream(String),
    // K 线数量不足以完成当前计算
    #[error("Insufficient data: need {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },
    // 数据源明确表示该标的不存在
    #[error("Symbol not found: {0}")]
    NotFound(String),
}
