use thiserror::Error;

/// # Summary
/// 缓存域错误枚举，处理序列化及底层存储故障。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 调用方应将缓存错误视为未命中，而不是业务失败。
#[derive(Error, Debug)]
pub enum CacheError {
    // 数据序列化失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    // 数据反序列化失败
    #[error("Deserialize error: {0}")]
    Deserialize(String),
    // 底层存储引擎故障
    #[error("Storage error: {0}")]
    Storage(String),
}
