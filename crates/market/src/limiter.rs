use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// 上游请求之间的默认最小间隔。
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(250);

/// # Summary
/// 上游请求节流器。
///
/// # Invariants
/// - 同一时刻最多只有一个上游请求在执行（互斥锁跨越整个请求）。
/// - 上一个请求结束到下一个请求开始之间至少间隔 `min_interval`。
/// - 调用方中途取消时，以取消时刻作为上一个请求的结束时间。
/// - 时间取自 tokio 时钟，测试中可暂停。
pub struct RateLimiter {
    min_interval: Duration,
    // 上一个请求的结束时间，尚无请求时为 None
    last_finished: Mutex<Option<Instant>>,
}

/// 持有节流锁；无论请求完成还是被取消，释放时都记录结束时间。
struct FinishStamp<'a> {
    last: MutexGuard<'a, Option<Instant>>,
}

impl Drop for FinishStamp<'_> {
    fn drop(&mut self) {
        *self.last = Some(Instant::now());
    }
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_finished: Mutex::new(None),
        }
    }

    /// # Summary
    /// 在节流保护下执行一次上游调用。
    ///
    /// # Logic
    /// 1. 获取互斥锁，排队等待前序请求完成。
    /// 2. 若距上次结束不足 `min_interval`，休眠补足差值。
    /// 3. 执行调用；结束时间由 `FinishStamp` 在释放锁时写入，取消也不例外。
    ///
    /// # Arguments
    /// * `call`: 实际的上游请求。
    ///
    /// # Returns
    /// 原样返回 `call` 的结果。
    pub async fn run<F, T>(&self, call: F) -> T
    where
        F: Future<Output = T>,
    {
        let last = self.last_finished.lock().await;
        if let Some(finished) = *last {
            let ready_at = finished + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let _stamp = FinishStamp { last };
        call.await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
