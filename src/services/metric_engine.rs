//! 指标引擎 - 业务能力层
//!
//! 每次调用只计算一个指标，输入为只读的文章集合，输出为每篇文章恰好一条结果。
//! 本地指标直接计算；模型指标委托给共享的 [`Dispatcher`]。

use std::sync::Arc;

use crate::clients::TextModel;
use crate::error::{CallError, MetricError};
use crate::infrastructure::Dispatcher;
use crate::models::{Metric, MetricResult, MetricValue, Passage, PassageStore};
use crate::services::prompts::{build_user_message, SYSTEM_MESSAGE};
use crate::services::readability::local_score;
use crate::services::response_parser::parse_response;
use tracing::{debug, warn};

/// 未配置凭据时模型指标的失败原因
pub const MISSING_CREDENTIALS: &str = "未配置 LLM_API_KEY, 跳过模型调用";

/// 指标引擎
pub struct MetricEngine<'a, M: TextModel> {
    store: &'a PassageStore,
    dispatcher: &'a Dispatcher,
    model: Option<Arc<M>>,
}

impl<'a, M: TextModel> MetricEngine<'a, M> {
    /// # 参数
    /// - `store`: 只读文章集合
    /// - `dispatcher`: 由驱动创建的共享调度器
    /// - `model`: 外部模型；为 `None` 时所有模型指标返回失败占位值
    pub fn new(store: &'a PassageStore, dispatcher: &'a Dispatcher, model: Option<Arc<M>>) -> Self {
        Self {
            store,
            dispatcher,
            model,
        }
    }

    /// 计算一个指标
    pub async fn compute(&self, metric: Metric) -> Result<Vec<MetricResult>, MetricError> {
        if metric.is_model_backed() {
            self.compute_model(metric).await
        } else {
            self.compute_local(metric)
        }
    }

    /// 本地公式指标：单篇失败只影响该篇
    pub fn compute_local(&self, metric: Metric) -> Result<Vec<MetricResult>, MetricError> {
        if metric.is_model_backed() {
            return Err(MetricError::WrongBacking {
                metric,
                expected: "本地公式",
            });
        }

        let results = self
            .store
            .passages()
            .iter()
            .map(|passage| {
                let value = match local_score(metric, &passage.text) {
                    Ok(score) => MetricValue::score(score),
                    Err(e) => {
                        warn!("[{}] 文章 {} 计算失败: {}", metric, passage.id, e);
                        MetricValue::failed(e.to_string())
                    }
                };
                MetricResult::new(passage.id.clone(), metric, value)
            })
            .collect();

        Ok(results)
    }

    /// 模型指标：每篇文章一次调用，经调度器并发执行
    pub async fn compute_model(&self, metric: Metric) -> Result<Vec<MetricResult>, MetricError> {
        if !metric.is_model_backed() {
            return Err(MetricError::WrongBacking {
                metric,
                expected: "模型",
            });
        }

        let passages = self.store.passages();

        let Some(model) = &self.model else {
            warn!("[{}] {}", metric, MISSING_CREDENTIALS);
            return Ok(passages
                .iter()
                .map(|p| {
                    MetricResult::new(p.id.clone(), metric, MetricValue::failed(MISSING_CREDENTIALS))
                })
                .collect());
        };

        debug!("[{}] 使用模型 {}", metric, model.model_name());

        let model = Arc::clone(model);
        let outcomes = self
            .dispatcher
            .dispatch(metric.name(), passages, move |passage: Passage| {
                let model = Arc::clone(&model);
                async move {
                    let user_message = build_user_message(metric, &passage.text)
                        .ok_or_else(|| CallError::Api(format!("指标 {} 没有提示词", metric)))?;
                    let reply = model.complete(SYSTEM_MESSAGE, &user_message).await?;
                    parse_response(metric, &reply)
                }
            })
            .await;

        if outcomes.len() != passages.len() {
            return Err(MetricError::ResultCountMismatch {
                metric,
                expected: passages.len(),
                got: outcomes.len(),
            });
        }

        Ok(passages
            .iter()
            .zip(outcomes)
            .map(|(passage, outcome)| {
                let value = match outcome.failure_reason() {
                    Some(reason) => MetricValue::failed(reason),
                    None => outcome
                        .into_value()
                        .unwrap_or_else(|| MetricValue::failed("缺少结果")),
                };
                MetricResult::new(passage.id.clone(), metric, value)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::RetryPolicy;
    use std::future::Future;
    use std::time::Duration;

    /// 固定回复的假模型
    struct FixedModel(&'static str);

    impl TextModel for FixedModel {
        fn complete(
            &self,
            _system_message: &str,
            _user_message: &str,
        ) -> impl Future<Output = Result<String, CallError>> + Send {
            let reply = self.0.to_string();
            async move { Ok(reply) }
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn store() -> PassageStore {
        PassageStore::from_passages(
            vec![
                Passage::new("p1", "Short simple sentence."),
                Passage::new("p2", "12345 ---"),
            ],
            "test",
        )
        .unwrap()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(2, RetryPolicy::no_retry(Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn test_local_metric_marks_bad_passage_only() {
        let store = store();
        let dispatcher = dispatcher();
        let engine = MetricEngine::<FixedModel>::new(&store, &dispatcher, None);
        let results = engine.compute(Metric::FleschKincaid).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].value.as_score().is_some());
        assert!(results[1].value.is_failed());
    }

    #[tokio::test]
    async fn test_model_metric_parses_replies() {
        let store = store();
        let dispatcher = dispatcher();
        let engine = MetricEngine::new(&store, &dispatcher, Some(Arc::new(FixedModel("7"))));
        let results = engine.compute(Metric::AbstractionLevel).await.unwrap();
        assert_eq!(
            results.iter().map(|r| r.passage_id.as_str()).collect::<Vec<_>>(),
            vec!["p1", "p2"]
        );
        assert!(results.iter().all(|r| r.value == MetricValue::score(7.0)));
    }

    #[tokio::test]
    async fn test_unparseable_reply_becomes_sentinel() {
        let store = store();
        let dispatcher = dispatcher();
        let engine = MetricEngine::new(&store, &dispatcher, Some(Arc::new(FixedModel("banana"))));
        let results = engine.compute(Metric::AuthorsPurpose).await.unwrap();
        assert!(results.iter().all(|r| r.value.is_failed()));
    }

    #[tokio::test]
    async fn test_missing_model_yields_sentinels_without_calls() {
        let store = store();
        let dispatcher = dispatcher();
        let engine = MetricEngine::<FixedModel>::new(&store, &dispatcher, None);
        let results = engine.compute(Metric::Lexile).await.unwrap();
        assert!(results
            .iter()
            .all(|r| r.value == MetricValue::failed(MISSING_CREDENTIALS)));
    }

    #[tokio::test]
    async fn test_wrong_backing_rejected() {
        let store = store();
        let dispatcher = dispatcher();
        let engine = MetricEngine::<FixedModel>::new(&store, &dispatcher, None);
        assert!(engine.compute_local(Metric::Lexile).is_err());
        assert!(engine.compute_model(Metric::FleschKincaid).await.is_err());
    }
}
