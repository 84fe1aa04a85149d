use crate::cache::error::CacheError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// # Summary
/// 业务无关的带有效期异步 KV 存储接口 (Port)。
///
/// # Invariants
/// - 处理原始字节，确保 Trait 是对象安全的 (Object Safe)。
/// - 有效期 (TTL) 由具体实例在构造时确定，同一实例内所有条目共享同一 TTL。
/// - 已过期条目对 `get_raw` 不可见，但不要求被主动清除。
/// - 条目只会被整体替换，不会被原地修改。
#[async_trait]
pub trait Cache: Send + Sync {
    /// # Summary
    /// 写入原始字节数据，并以当前时间作为抓取时间。
    ///
    /// # Logic
    /// 1. 以原子方式整体替换旧条目。
    ///
    /// # Arguments
    /// * `key`: 唯一键。
    /// * `value`: 原始字节数组。
    ///
    /// # Returns
    /// 成功返回 Ok，失败返回 `CacheError`。
    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// # Summary
    /// 获取仍在有效期内的原始字节数据。
    ///
    /// # Arguments
    /// * `key`: 唯一键。
    ///
    /// # Returns
    /// 存在且未过期则返回 `Some(Vec<u8>)`，否则返回 `None`。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// # Summary
    /// 使指定键失效。
    ///
    /// # Returns
    /// 无论键是否存在均返回 Ok。
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

/// # Summary
/// 缓存泛型扩展接口，提供便捷的序列化支持。
///
/// # Invariants
/// - 自动为所有实现 `Cache` 的类型提供支持。
/// - 浮点数经 JSON 往返后必须逐位相等。
#[async_trait]
pub trait CacheExt: Cache {
    /// # Summary
    /// 存入强类型对象。
    ///
    /// # Logic
    /// 1. 使用 JSON 序列化对象。
    /// 2. 调用底层 `put_raw` 写入。
    async fn put<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialize(e.to_string()))?;
        self.put_raw(key, bytes).await
    }

    /// # Summary
    /// 取出强类型对象。
    ///
    /// # Logic
    /// 1. 调用底层 `get_raw` 获取字节。
    /// 2. 使用 JSON 反序列化为目标类型。
    ///
    /// # Returns
    /// 反序列化后的对象或 None。
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_raw(key).await? {
            Some(bytes) => {
                let val = serde_json::from_slice(&bytes)
                    .map_err(|e| CacheError::Deserialize(e.to_string()))?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}
