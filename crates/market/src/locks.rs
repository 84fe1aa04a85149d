use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// # Summary
/// 按键划分的异步互斥锁表，用于单键回源与单键渲染。
///
/// # Invariants
/// - 同一键同一时刻只有一把锁；持有者或等待者存在时条目不会被移除。
/// - 最后一个持有者释放后条目被移除，表的大小只取决于进行中的键。
#[derive(Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// 持有某个键的锁；析构时释放锁，无人等待则移除条目。
pub struct KeyGuard<'a> {
    owner: &'a KeyedLocks,
    key: String,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// 等待并持有该键的锁，条目不存在时创建。
    ///
    /// # Logic
    /// 先克隆锁再释放表的分片引用，等待期间不阻塞其他键。
    pub async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.clone().lock_owned().await;
        KeyGuard {
            owner: self,
            key: key.to_string(),
            lock,
            guard: Some(guard),
        }
    }

    /// 当前表中的键数量。
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for KeyGuard<'_> {
    // 引用计数为 2（表 + 本守卫）说明没有其他等待者。
    // 计数检查与移除在同一分片写锁内完成，不会与 `lock` 交错。
    fn drop(&mut self) {
        drop(self.guard.take());
        self.owner.locks.remove_if(&self.key, |_, held| {
            Arc::ptr_eq(held, &self.lock) && Arc::strong_count(held) == 2
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_release_removes_entry() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock("history:AAPL:1y").await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_many_keys_do_not_accumulate() {
        let locks = KeyedLocks::new();
        for i in 0..100 {
            let _guard = locks.lock(&format!("chart:SYM{}:1d:price", i)).await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_kept_while_waiter_pending() {
        let locks = Arc::new(KeyedLocks::new());
        let first = locks.lock("chart:ZZZZ:1d:price").await;

        let waiter = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.lock("chart:ZZZZ:1d:price").await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        drop(first);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_waiter_does_not_leak() {
        let locks = Arc::new(KeyedLocks::new());
        let first = locks.lock("history:TSLA:1y").await;

        let waiter = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.lock("history:TSLA:1y").await;
            }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        drop(first);
        assert!(locks.is_empty());
    }
}
