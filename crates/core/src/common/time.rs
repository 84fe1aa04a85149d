use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 所有缓存的有效期判定必须通过此接口获取当前时间。
pub trait TimeProvider: Send + Sync {
    /// 获取当前挂载的时间
    fn now(&self) -> DateTime<Utc>;
}

/// # Summary
/// 生产环境使用的真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 测试专用虚拟时钟，允许主动拨快或回退时间。
///
/// # Invariants
/// - 并发安全：内部利用 `RwLock` 提供多线程安全的读写。
/// - 锁中毒时沿用中毒前的值，不会 panic。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self.current_time.write().unwrap_or_else(|e| e.into_inner());
        *time = new_time;
    }

    /// 将时钟向前拨动指定时长
    pub fn advance(&self, delta: Duration) {
        let mut time = self.current_time.write().unwrap_or_else(|e| e.into_inner());
        *time += delta;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.current_time.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fake_clock_advance() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        let clock = FakeClockProvider::new(t0);
        assert_eq!(clock.now(), t0);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), t0 + Duration::seconds(90));

        clock.set_time(t0);
        assert_eq!(clock.now(), t0);
    }
}
