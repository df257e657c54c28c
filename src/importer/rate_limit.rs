//! 网络请求限流
//!
//! 每次受限调用占用一个固定时间片（`1s / N`）：执行完工作后，
//! 若耗时不足一个时间片，则休眠剩余部分。因此任意一秒内最多完成 N 次受限调用。
//!
//! 只有真正发生网络 I/O 的调用才应经过 `throttle`；缓存命中直接读取，不进入限流器。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    slot: Duration,
    throttled: AtomicU64,
}

impl RateLimiter {
    /// `max_per_second` 为 0 时按 1 处理。
    pub fn new(max_per_second: u32) -> Self {
        Self {
            slot: Duration::from_secs(1) / max_per_second.max(1),
            throttled: AtomicU64::new(0),
        }
    }

    /// 单次调用的时间片长度。
    pub fn slot(&self) -> Duration {
        self.slot
    }

    /// 执行一次网络工作并补足剩余时间片。
    pub async fn throttle<F, T>(&self, work: F) -> T
    where
        F: Future<Output = T>,
    {
        let start = Instant::now();
        let output = work.await;
        let elapsed = start.elapsed();

        if let Some(residual) = self.slot.checked_sub(elapsed) {
            if !residual.is_zero() {
                tokio::time::sleep(residual).await;
            }
        }

        self.throttled.fetch_add(1, Ordering::Relaxed);
        output
    }

    /// 累计经过限流器的调用次数。
    pub fn throttled_calls(&self) -> u64 {
        self.throttled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_one_second_divided_by_ceiling() {
        assert_eq!(RateLimiter::new(20).slot(), Duration::from_millis(50));
        assert_eq!(RateLimiter::new(0).slot(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn twenty_five_cheap_calls_take_at_least_their_slots() {
        let limiter = RateLimiter::new(20);
        let start = Instant::now();

        for i in 0..25 {
            let value = limiter.throttle(async { i * 2 }).await;
            assert_eq!(value, i * 2);
        }

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(25 * 50), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(25 * 50 + 750), "elapsed {:?}", elapsed);
        assert_eq!(limiter.throttled_calls(), 25);
    }

    #[tokio::test]
    async fn slow_work_is_not_padded() {
        let limiter = RateLimiter::new(20);
        let start = Instant::now();

        limiter
            .throttle(tokio::time::sleep(Duration::from_millis(120)))
            .await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(120));
        assert!(elapsed < Duration::from_millis(400), "elapsed {:?}", elapsed);
        assert_eq!(limiter.throttled_calls(), 1);
    }
}
