use thiserror::Error;

/// # Summary
/// 聊天通道错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum NotifyError {
    /// 请求未送达平台 (连接失败、超时)
    #[error("Network error: {0}")]
    Network(String),

    /// 通道无法初始化 (如缺少 Token)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 平台拒绝请求或返回无法解析的响应
    #[error("Platform error: {0}")]
    Platform(String),
}
