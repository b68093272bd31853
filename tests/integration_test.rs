use passage_analyzer::config::Config;
use passage_analyzer::error::{AppError, CallError, LoadError, WriteError};
use passage_analyzer::infrastructure::{Dispatcher, RetryPolicy, TaskOutcome};
use passage_analyzer::models::{Metric, Passage};
use passage_analyzer::{logger, App, LlmClient, TextModel};
use rand::Rng;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// 按提示词里的答题格式给出合法回复，并统计调用次数
#[derive(Default)]
struct ScriptedModel {
    calls: AtomicUsize,
}

impl TextModel for ScriptedModel {
    fn complete(
        &self,
        _system_message: &str,
        user_message: &str,
    ) -> impl Future<Output = Result<String, CallError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if let Some(rest) = user_message.split("labels: ").nth(1) {
            rest.split([',', '.']).next().unwrap_or_default().to_string()
        } else if user_message.contains("integer between") {
            "900".to_string()
        } else {
            "6".to_string()
        };
        async move { Ok(reply) }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn passages(n: usize) -> Vec<Passage> {
    (0..n)
        .map(|i| Passage::new(format!("p{}", i), format!("Passage number {} text.", i)))
        .collect()
}

fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        call_timeout: Duration::from_secs(2),
    }
}

fn write_passages(dir: &std::path::Path, body: &str) -> String {
    let path = dir.join("passages.json");
    std::fs::write(&path, body).unwrap();
    path.display().to_string()
}

/// 不同 worker 数量下结果顺序与内容一致
#[tokio::test]
async fn test_results_positional_across_worker_counts() {
    let input = passages(12);
    let mut runs = Vec::new();

    for workers in [1, 5] {
        let dispatcher = Dispatcher::new(workers, quick_policy(1));
        let outcomes = dispatcher
            .dispatch("length", &input, |passage: Passage| async move {
                let jitter = rand::thread_rng().gen_range(0..5);
                tokio::time::sleep(Duration::from_millis(jitter)).await;
                Ok(passage.text.len())
            })
            .await;
        assert_eq!(outcomes.len(), input.len());
        runs.push(
            outcomes
                .into_iter()
                .map(|o| o.into_value().unwrap())
                .collect::<Vec<_>>(),
        );
    }

    let expected: Vec<usize> = input.iter().map(|p| p.text.len()).collect();
    assert_eq!(runs[0], expected);
    assert_eq!(runs[1], expected);
}

/// 一篇文章永久失败不影响其他文章
#[tokio::test]
async fn test_single_failure_isolated() {
    let input = passages(6);
    let dispatcher = Dispatcher::new(3, quick_policy(3));
    let outcomes = dispatcher
        .dispatch("isolate", &input, |passage: Passage| async move {
            if passage.id == "p3" {
                Err(CallError::Api("invalid request".to_string()))
            } else {
                Ok(passage.id)
            }
        })
        .await;

    for (i, outcome) in outcomes.iter().enumerate() {
        if i == 3 {
            assert!(matches!(outcome, TaskOutcome::Failed { attempts: 1, .. }));
        } else {
            assert_eq!(outcome.value(), Some(&format!("p{}", i)));
        }
    }
}

/// 重试后成功的结果与首次成功无法区分
#[tokio::test]
async fn test_retried_success_matches_first_attempt() {
    let input = passages(2);
    let attempts = Arc::new(Mutex::new(std::collections::HashMap::<String, u32>::new()));
    let dispatcher = Dispatcher::new(2, quick_policy(4));

    let counter = Arc::clone(&attempts);
    let outcomes = dispatcher
        .dispatch("flaky", &input, move |passage: Passage| {
            let counter = Arc::clone(&counter);
            async move {
                let attempt = {
                    let mut map = counter.lock().unwrap();
                    let entry = map.entry(passage.id.clone()).or_insert(0);
                    *entry += 1;
                    *entry
                };
                // 只有 p0 前两次失败
                if passage.id == "p0" && attempt < 3 {
                    Err(CallError::Network("connection reset".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

    assert_eq!(outcomes[0].value(), outcomes[1].value());
    assert!(matches!(outcomes[0], TaskOutcome::Completed { attempts: 3, .. }));
    assert!(matches!(outcomes[1], TaskOutcome::Completed { attempts: 1, .. }));
}

/// 随机瞬时失败下所有位置都会被填充
#[tokio::test]
async fn test_random_transient_failures_fill_every_slot() {
    let input = passages(10);
    let dispatcher = Dispatcher::new(3, quick_policy(4));
    let outcomes = dispatcher
        .dispatch("random", &input, |passage: Passage| async move {
            if rand::thread_rng().gen_bool(0.2) {
                Err(CallError::RateLimited { retry_after: None })
            } else {
                Ok(passage.id)
            }
        })
        .await;

    assert_eq!(outcomes.len(), 10);
    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            TaskOutcome::Completed { value, .. } => assert_eq!(value, &format!("p{}", i)),
            TaskOutcome::Failed { attempts, .. } => assert_eq!(*attempts, 4),
            TaskOutcome::Cancelled => panic!("p{} 不应被取消", i),
        }
    }
}

/// 空文章集合在计算任何指标之前失败
#[tokio::test]
async fn test_empty_collection_fails_before_any_metric() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        passages_file: write_passages(dir.path(), "[]"),
        output_dir: dir.path().join("out").display().to_string(),
        ..Config::default()
    };
    let model = Arc::new(ScriptedModel::default());

    let app = App::initialize(config);
    let err = assert_err!(app.run_with_model(Some(Arc::clone(&model))).await);

    assert!(matches!(err, AppError::Load(LoadError::Empty { .. })));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("out").exists());
}

/// 完整流程：加载 → 全部指标 → 报告
#[tokio::test]
async fn test_full_pipeline_writes_reports() {
    let dir = tempfile::tempdir().unwrap();
    let body = r#"{"passages": [
        {"id": "a", "text": "The cat sat on the mat. It was warm."},
        {"id": "b", "text": "Photosynthesis converts light energy into chemical energy within chloroplasts."},
        {"id": "c", "text": "12345 ---"}
    ]}"#;
    let config = Config {
        passages_file: write_passages(dir.path(), body),
        output_dir: dir.path().join("results").display().to_string(),
        max_workers: 2,
        ..Config::default()
    };
    let model = Arc::new(ScriptedModel::default());

    let summary = assert_ok!(App::initialize(config)
        .run_with_model(Some(Arc::clone(&model)))
        .await);

    assert_eq!(summary.passages, 3);
    assert_eq!(summary.metrics, Metric::ALL.len());
    assert!(!summary.cancelled);

    let model_metrics = Metric::ALL.iter().filter(|m| m.is_model_backed()).count();
    assert_eq!(model.calls.load(Ordering::SeqCst), model_metrics * 3);

    // 只有无词文章 "c" 的本地指标失败
    let local_metrics = Metric::ALL.len() - model_metrics;
    assert_eq!(summary.failures, local_metrics);

    let csv = std::fs::read_to_string(&summary.report.scores_csv).unwrap();
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("passage_id,lexile,flesch_kincaid"));
    let ids: Vec<&str> = lines.map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let scores: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary.report.scores_json).unwrap())
            .unwrap();
    assert_eq!(scores[0]["metrics"]["lexile"], 900.0);
    assert_eq!(scores[0]["metrics"]["authors_purpose"], "inform");
    assert!(scores[2]["metrics"]["flesch_kincaid"].is_null());
    assert!(scores[2]["failures"]["flesch_kincaid"].is_string());

    let summary_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary.report.summary_json).unwrap())
            .unwrap();
    assert_eq!(summary_json["passage_count"], 3);
}

/// 输出目录被普通文件占用时报告写入失败
#[tokio::test]
async fn test_report_write_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocked");
    std::fs::write(&blocker, "not a directory").unwrap();

    let config = Config {
        passages_file: write_passages(dir.path(), r#"[{"id": "a", "text": "Plain words here."}]"#),
        output_dir: blocker.display().to_string(),
        metrics: vec![Metric::FleschKincaid],
        ..Config::default()
    };

    let err = assert_err!(App::initialize(config)
        .run_with_model::<ScriptedModel>(None)
        .await);
    assert!(matches!(err, AppError::Write(WriteError::CreateDirFailed { .. })));
}

/// 取消后未开始的文章记录为取消占位值
#[tokio::test]
async fn test_cancelled_dispatcher_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        passages_file: write_passages(
            dir.path(),
            r#"[{"id": "a", "text": "One two."}, {"id": "b", "text": "Three four."}]"#,
        ),
        output_dir: dir.path().join("results").display().to_string(),
        metrics: vec![Metric::FleschKincaid, Metric::AbstractionLevel],
        ..Config::default()
    };
    let model = Arc::new(ScriptedModel::default());

    let app = App::initialize(config);
    app.dispatcher().cancel();
    let summary = assert_ok!(app.run_with_model(Some(Arc::clone(&model))).await);

    assert!(summary.cancelled);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    // 本地指标不受影响，模型指标两篇都是占位值
    assert_eq!(summary.failures, 2);
    assert!(summary.report.scores_csv.exists());
}

#[tokio::test]
#[ignore] // 需要 LLM_API_KEY：cargo test -- --ignored
async fn test_live_pipeline() {
    logger::init(true);
    let config = Config::from_env().expect("配置无效");
    assert!(config.has_llm_credentials(), "需要设置 LLM_API_KEY");

    let client = Arc::new(LlmClient::new(&config));
    let summary = App::initialize(config)
        .run_with_model(Some(client))
        .await
        .expect("分析失败");
    assert!(summary.report.summary_json.exists());
}
