//! 重试与退避策略

use crate::error::CallError;
use rand::Rng;
use std::time::Duration;

/// 单篇文章外部调用的重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次），至少为 1
    pub max_attempts: u32,
    /// 第一次重试前的等待时间
    pub base_delay: Duration,
    /// 单次等待上限
    pub max_delay: Duration,
    /// 单次调用超时
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            call_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// 不重试（只尝试一次）
    pub fn no_retry(call_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            call_timeout,
        }
    }

    /// 第 `attempt` 次（从 1 开始）失败后的指数退避时间，不含抖动
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }

    /// 实际等待时间
    ///
    /// 限流响应带有 `retry_after` 时优先使用（不超过上限），
    /// 否则在指数退避基础上叠加最多 25% 的随机抖动。
    pub fn delay_for(&self, attempt: u32, error: &CallError) -> Duration {
        if let Some(hint) = error.retry_after() {
            return hint.min(self.max_delay);
        }
        let delay = self.backoff_delay(attempt);
        let jitter_cap = (delay.as_millis() / 4) as u64;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_cap)
        };
        (delay + Duration::from_millis(jitter)).min(self.max_delay)
    }
}
