//! 有界轮询原语
//!
//! 所有"等某个条件出现"的地方（处理完成、按钮可用、确认信号）
//! 都共用这一个原语：固定间隔 + 明确上限，绝不无限等待。

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// 以固定间隔轮询，直到闭包返回 Some 或达到时限
///
/// # 参数
/// - `interval`: 轮询间隔
/// - `ceiling`: 总时限
/// - `probe`: 每轮执行的探测，返回 `Some(T)` 表示条件满足
///
/// # 返回
/// 条件满足时返回 `Some(T)`；超时返回 `None`
pub async fn poll_until<F, Fut, T>(interval: Duration, ceiling: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + ceiling;
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        if Instant::now() + interval > deadline {
            return None;
        }
        sleep(interval).await;
    }
}

/// 线性退避：第 n 轮（从 0 开始）等待 base * (n + 1)，封顶 cap
pub fn linear_backoff(base: Duration, cap: Duration, iteration: usize) -> Duration {
    let stepped = base.saturating_mul(iteration as u32 + 1);
    stepped.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn poll_returns_first_hit() {
        let calls = Cell::new(0usize);
        let result = tokio_test::block_on(poll_until(
            Duration::from_millis(1),
            Duration::from_secs(1),
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { (n >= 3).then_some(n) }
            },
        ));
        assert_eq!(result, Some(3));
    }

    #[test]
    fn poll_respects_ceiling() {
        let result: Option<()> = tokio_test::block_on(poll_until(
            Duration::from_millis(5),
            Duration::from_millis(20),
            || async { None },
        ));
        assert!(result.is_none());
    }

    #[test]
    fn backoff_is_monotonic_and_capped() {
        let base = Duration::from_millis(500);
        let cap = Duration::from_secs(4);
        let mut last = Duration::ZERO;
        for i in 0..20 {
            let d = linear_backoff(base, cap, i);
            assert!(d >= last);
            assert!(d <= cap);
            last = d;
        }
        assert_eq!(linear_backoff(base, cap, 0), Duration::from_millis(500));
        assert_eq!(linear_backoff(base, cap, 1), Duration::from_millis(1000));
        assert_eq!(linear_backoff(base, cap, 19), cap);
    }
}
