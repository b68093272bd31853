//! 分析驱动 - 编排层
//!
//! ## 职责
//!
//! 1. **加载文章**：启动时加载一次，失败即终止（不计算任何指标）
//! 2. **依次计算指标**：每个指标独立的失败边界，失败写入占位值后继续下一个
//! 3. **资源管理**：持有唯一的 `Dispatcher`，借给每个模型指标
//! 4. **取消**：Ctrl-C 触发调度器取消，已计算的结果仍会写入报告
//! 5. **生成报告**：写入失败为致命错误

use crate::clients::{LlmClient, TextModel};
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::Dispatcher;
use crate::models::{load_passages, Metric, MetricResults, PassageStore};
use crate::services::{MetricEngine, ReportGenerator, ReportPaths};
use crate::utils::logging::{
    log_metric_complete, log_metric_start, log_passages_loaded, log_startup, print_final_stats,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: ReportPaths,
    pub elapsed: Duration,
    pub passages: usize,
    pub metrics: usize,
    pub failures: usize,
    pub cancelled: bool,
}

/// 应用主结构
pub struct App {
    config: Config,
    dispatcher: Dispatcher,
}

impl App {
    /// 初始化应用（创建共享调度器）
    pub fn initialize(config: Config) -> Self {
        log_startup(&config);
        let dispatcher = Dispatcher::new(config.max_workers, config.retry_policy());
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// 运行应用主逻辑（使用配置中的 LLM 客户端）
    pub async fn run(&self) -> AppResult<RunSummary> {
        let model = if self.config.has_llm_credentials() {
            Some(Arc::new(LlmClient::new(&self.config)))
        } else {
            warn!("⚠️ 未设置 LLM_API_KEY，模型指标将记录为失败占位值");
            None
        };
        self.run_with_model(model).await
    }

    /// 使用指定模型运行
    pub async fn run_with_model<M: TextModel>(
        &self,
        model: Option<Arc<M>>,
    ) -> AppResult<RunSummary> {
        let started = Instant::now();

        let store = load_passages(Path::new(&self.config.passages_file)).await?;

        let metrics = self.config.selected_metrics();
        log_passages_loaded(store.len(), metrics.len());

        let ctrl_c = tokio::spawn(watch_interrupts(
            tokio::signal::ctrl_c,
            self.dispatcher.cancellation_token(),
            || std::process::exit(130),
        ));

        let results = self.compute_all(&store, model, &metrics).await;
        let report = ReportGenerator::new(&self.config.output_dir).write(&store, &results);
        ctrl_c.abort();
        let report = report?;

        let summary = RunSummary {
            report,
            elapsed: started.elapsed(),
            passages: store.len(),
            metrics: metrics.len(),
            failures: results.total_failures(),
            cancelled: self.dispatcher.is_cancelled(),
        };

        print_final_stats(
            summary.passages,
            summary.metrics,
            summary.failures,
            &summary.report.dir.display().to_string(),
        );

        Ok(summary)
    }

    /// 依次计算所有指标，每个指标一个失败边界
    pub async fn compute_all<M: TextModel>(
        &self,
        store: &PassageStore,
        model: Option<Arc<M>>,
        metrics: &[Metric],
    ) -> MetricResults {
        let engine = MetricEngine::new(store, &self.dispatcher, model);
        let mut results = MetricResults::new(store);

        for (index, metric) in metrics.iter().copied().enumerate() {
            log_metric_start(index + 1, metrics.len(), metric);
            let started = Instant::now();

            let run = match engine.compute(metric).await {
                Ok(batch) => match results.record(metric, batch) {
                    Ok(run) => run,
                    Err(e) => {
                        error!("[{}] 结果无法记录: {}", metric, e);
                        results.record_failure(metric, &e)
                    }
                },
                Err(e) => {
                    error!("[{}] 计算失败: {}", metric, e);
                    results.record_failure(metric, &e)
                }
            };

            log_metric_complete(&run, started.elapsed());
        }

        results
    }
}

/// 中断监听：第一次取消调度器，第二次调用 `force_exit`
///
/// 整个运行期间（含报告写入）都保持监听。
async fn watch_interrupts<F, Fut, X>(mut next_signal: F, token: CancellationToken, force_exit: X)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
    X: FnOnce(),
{
    if next_signal().await.is_err() {
        return;
    }
    warn!("⛔ 收到 Ctrl-C，等待进行中的调用结束后生成报告（再按一次立即退出）");
    token.cancel();

    if next_signal().await.is_ok() {
        error!("⛔ 再次收到 Ctrl-C，立即退出");
        force_exit();
    }
}
