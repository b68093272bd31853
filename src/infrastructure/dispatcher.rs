//! 并行调度器 - 基础设施层
//!
//! ## 职责
//!
//! 把一批文章扇出给固定数量的 worker，每个 worker 从共享队列中取下一篇，
//! 执行一个工作单元（通常是一次外部模型调用），完成后再取下一篇。
//!
//! ## 保证
//!
//! - 返回结果数量等于输入数量，`result[i]` 对应 `passages[i]`
//! - 内部完成顺序不受约束，输出顺序只按位置
//! - 临时错误按 [`RetryPolicy`] 退避重试；重试耗尽或遇到非临时错误时写入失败占位值，
//!   其余文章继续处理
//! - 取消后不再启动新的工作单元（包括新的重试），进行中的调用允许完成或超时
//!
//! 调度器由驱动创建一次，借给每个需要外部模型的指标调用。

use crate::error::CallError;
use crate::infrastructure::retry::RetryPolicy;
use crate::models::Passage;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 单篇文章的调度结果
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    /// 成功（`attempts` 为实际尝试次数）
    Completed { value: T, attempts: u32 },
    /// 失败占位值：重试耗尽或非临时错误
    Failed { reason: String, attempts: u32 },
    /// 取消后未执行
    Cancelled,
}

impl<T> TaskOutcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            TaskOutcome::Completed { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            TaskOutcome::Completed { value, .. } => Some(value),
            _ => None,
        }
    }

    /// 是否为占位值（失败或取消）
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, TaskOutcome::Completed { .. })
    }

    /// 占位值的原因描述
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            TaskOutcome::Completed { .. } => None,
            TaskOutcome::Failed { reason, attempts } => {
                Some(format!("{} (尝试 {} 次)", reason, attempts))
            }
            TaskOutcome::Cancelled => Some("已取消".to_string()),
        }
    }
}

/// 一次调度的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub retried: usize,
}

impl DispatchStats {
    pub fn from_outcomes<T>(outcomes: &[TaskOutcome<T>]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Completed { attempts, .. } => {
                    stats.completed += 1;
                    if *attempts > 1 {
                        stats.retried += 1;
                    }
                }
                TaskOutcome::Failed { attempts, .. } => {
                    stats.failed += 1;
                    if *attempts > 1 {
                        stats.retried += 1;
                    }
                }
                TaskOutcome::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }
}

/// 有界并发调度器
#[derive(Debug, Clone)]
pub struct Dispatcher {
    max_workers: usize,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// 创建调度器；`max_workers` 至少为 1
    pub fn new(max_workers: usize, policy: RetryPolicy) -> Self {
        Self {
            max_workers: max_workers.max(1),
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// 请求取消：不再启动新的工作单元
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            warn!("⛔ 收到取消请求，不再启动新的调用");
        }
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 共享的取消令牌（例如交给 Ctrl-C 监听任务）
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 对每篇文章执行一次 `work`，按输入顺序返回结果
    ///
    /// # 参数
    /// - `label`: 日志标签（通常是指标名）
    /// - `passages`: 输入文章
    /// - `work`: 工作单元，返回 `CallError` 时由 `is_transient()` 决定是否重试
    pub async fn dispatch<T, F, Fut>(
        &self,
        label: &str,
        passages: &[Passage],
        work: F,
    ) -> Vec<TaskOutcome<T>>
    where
        T: Send + 'static,
        F: Fn(Passage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, CallError>> + Send + 'static,
    {
        let total = passages.len();
        if total == 0 {
            return Vec::new();
        }

        let queue: Arc<[Passage]> = Arc::from(passages.to_vec());
        let next = Arc::new(AtomicUsize::new(0));
        let work = Arc::new(work);
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, TaskOutcome<T>)>();

        let workers = self.max_workers.min(total);
        debug!("[{}] 启动 {} 个 worker 处理 {} 篇文章", label, workers, total);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let next = Arc::clone(&next);
            let work = Arc::clone(&work);
            let tx = tx.clone();
            let cancel = self.cancel.clone();
            let policy = self.policy;
            let label = label.to_string();

            handles.push(tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    let Some(passage) = queue.get(index) else {
                        break;
                    };

                    let outcome = AssertUnwindSafe(run_with_retry(
                        work.as_ref(),
                        passage,
                        &policy,
                        &cancel,
                        &label,
                    ))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        error!("[{}] 文章 {} 的工作单元 panic", label, passage.id);
                        TaskOutcome::Failed {
                            reason: "工作单元 panic".to_string(),
                            attempts: 1,
                        }
                    });

                    debug!("[{}] worker {} 完成文章 {}", label, worker_id, passage.id);
                    if tx.send((index, outcome)).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(tx);

        // 每个位置只写一次
        let mut slots: Vec<Option<TaskOutcome<T>>> = (0..total).map(|_| None).collect();
        while let Some((index, outcome)) = rx.recv().await {
            slots[index] = Some(outcome);
        }

        for joined in futures::future::join_all(handles).await {
            if let Err(e) = joined {
                error!("[{}] worker 异常退出: {}", label, e);
            }
        }

        let outcomes: Vec<TaskOutcome<T>> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(TaskOutcome::Cancelled))
            .collect();

        let stats = DispatchStats::from_outcomes(&outcomes);
        info!(
            "[{}] 调度完成: 成功 {}/{}, 失败 {}, 取消 {}, 经过重试 {}",
            label, stats.completed, total, stats.failed, stats.cancelled, stats.retried
        );

        outcomes
    }
}

/// 执行单个工作单元，按策略处理超时与重试
async fn run_with_retry<T, F, Fut>(
    work: &F,
    passage: &Passage,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
) -> TaskOutcome<T>
where
    F: Fn(Passage) -> Fut,
    Fut: Future<Output = Result<T, CallError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = match timeout(policy.call_timeout, work(passage.clone())).await {
            Ok(result) => result,
            Err(_) => Err(CallError::Timeout {
                after: policy.call_timeout,
            }),
        };

        match result {
            Ok(value) => {
                if attempt > 1 {
                    debug!("[{}] 文章 {} 第 {} 次尝试成功", label, passage.id, attempt);
                }
                return TaskOutcome::Completed {
                    value,
                    attempts: attempt,
                };
            }
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt, &err);
                warn!(
                    "[{}] 文章 {} 调用失败 (尝试 {}/{}): {}, {:?} 后重试",
                    label, passage.id, attempt, max_attempts, err, delay
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        warn!("[{}] 文章 {} 等待重试时被取消", label, passage.id);
                        return TaskOutcome::Cancelled;
                    }
                    _ = sleep(delay) => {}
                }
            }
            Err(err) => {
                warn!(
                    "[{}] ❌ 文章 {} 放弃 (尝试 {} 次): {}",
                    label, passage.id, attempt, err
                );
                return TaskOutcome::Failed {
                    reason: err.to_string(),
                    attempts: attempt,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    fn passages(n: usize) -> Vec<Passage> {
        (0..n)
            .map(|i| Passage::new(format!("p{}", i), format!("text {}", i)))
            .collect()
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            call_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty() {
        let dispatcher = Dispatcher::new(3, fast_policy(1));
        let out = dispatcher
            .dispatch("empty", &[], |_p: Passage| async { Ok::<_, CallError>(1) })
            .await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_positional_order_despite_completion_order() {
        let dispatcher = Dispatcher::new(4, fast_policy(1));
        let input = passages(8);
        let out = dispatcher
            .dispatch("order", &input, |p: Passage| async move {
                let n: u64 = p.id[1..].parse().unwrap();
                // 前面的文章更慢，保证完成顺序与输入相反
                sleep(Duration::from_millis(40 - n * 5)).await;
                Ok::<_, CallError>(p.id)
            })
            .await;
        let ids: Vec<_> = out.into_iter().map(|o| o.into_value().unwrap()).collect();
        assert_eq!(ids, input.iter().map(|p| p.id.clone()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_transient_failure_retried_until_success() {
        let calls = Arc::new(Mutex::new(HashMap::<String, u32>::new()));
        let counter = Arc::clone(&calls);
        let dispatcher = Dispatcher::new(2, fast_policy(3));
        let out = dispatcher
            .dispatch("retry", &passages(3), move |p: Passage| {
                let counter = Arc::clone(&counter);
                async move {
                    let attempt = {
                        let mut map = counter.lock().unwrap();
                        let entry = map.entry(p.id.clone()).or_insert(0);
                        *entry += 1;
                        *entry
                    };
                    if attempt < 3 {
                        Err(CallError::RateLimited { retry_after: None })
                    } else {
                        Ok(p.text.len())
                    }
                }
            })
            .await;
        for outcome in &out {
            assert!(matches!(outcome, TaskOutcome::Completed { value: 6, attempts: 3 }));
        }
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let dispatcher = Dispatcher::new(2, fast_policy(5));
        let out = dispatcher
            .dispatch("permanent", &passages(2), |_p: Passage| async {
                Err::<u8, _>(CallError::Api("invalid key".into()))
            })
            .await;
        assert!(out
            .iter()
            .all(|o| matches!(o, TaskOutcome::Failed { attempts: 1, .. })));
    }

    #[tokio::test]
    async fn test_timeout_becomes_sentinel_after_retries() {
        let dispatcher = Dispatcher::new(1, fast_policy(2));
        let out = dispatcher
            .dispatch("timeout", &passages(1), |_p: Passage| async {
                sleep(Duration::from_secs(5)).await;
                Ok::<_, CallError>(())
            })
            .await;
        assert!(matches!(&out[0], TaskOutcome::Failed { attempts: 2, reason } if reason.contains("超时")));
    }

    #[tokio::test]
    async fn test_panicking_unit_only_affects_its_slot() {
        let dispatcher = Dispatcher::new(2, fast_policy(1));
        let out = dispatcher
            .dispatch("panic", &passages(4), |p: Passage| async move {
                if p.id == "p1" {
                    panic!("boom");
                }
                Ok::<_, CallError>(p.id)
            })
            .await;
        assert_eq!(out.len(), 4);
        assert!(out[1].is_sentinel());
        assert_eq!(out[3].value().map(String::as_str), Some("p3"));
    }

    #[tokio::test]
    async fn test_cancel_before_dispatch_marks_all_cancelled() {
        let dispatcher = Dispatcher::new(3, fast_policy(1));
        dispatcher.cancel();
        let out = dispatcher
            .dispatch("cancelled", &passages(5), |_p: Passage| async {
                Ok::<_, CallError>(0)
            })
            .await;
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|o| *o == TaskOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_mid_batch_lets_in_flight_finish() {
        let dispatcher = Dispatcher::new(1, fast_policy(1));
        let token = dispatcher.cancellation_token();
        let out = dispatcher
            .dispatch("mid", &passages(4), move |p: Passage| {
                let token = token.clone();
                async move {
                    if p.id == "p1" {
                        token.cancel();
                        sleep(Duration::from_millis(20)).await;
                    }
                    Ok::<_, CallError>(p.id)
                }
            })
            .await;
        assert_eq!(out[0].value().map(String::as_str), Some("p0"));
        assert_eq!(out[1].value().map(String::as_str), Some("p1"));
        assert_eq!(out[2], TaskOutcome::Cancelled);
        assert_eq!(out[3], TaskOutcome::Cancelled);
    }

    #[test]
    fn test_stats_from_outcomes() {
        let outcomes = vec![
            TaskOutcome::Completed {
                value: 1,
                attempts: 1,
            },
            TaskOutcome::Completed {
                value: 2,
                attempts: 2,
            },
            TaskOutcome::Failed {
                reason: "x".into(),
                attempts: 3,
            },
            TaskOutcome::Cancelled,
        ];
        assert_eq!(
            DispatchStats::from_outcomes(&outcomes),
            DispatchStats {
                completed: 2,
                failed: 1,
                cancelled: 1,
                retried: 2
            }
        );
    }
}
