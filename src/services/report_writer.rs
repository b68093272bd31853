//! 报告生成
//!
//! 汇总每篇文章的全部指标，计算综合难度，写出三个文件：
//! - `passage_scores.csv` - 每篇一行，失败值为空单元格
//! - `passage_scores.json` - 每篇的指标值（失败为 null）及失败原因
//! - `summary.json` - 每个指标的统计与综合难度分布
//!
//! 写入失败返回 `WriteError`，不重试。

use crate::error::WriteError;
use crate::models::{Metric, MetricGroup, MetricResults, MetricRun, MetricValue, PassageStore};
use crate::services::difficulty::{overall_difficulty, Difficulty, DifficultyBand};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SCORES_CSV: &str = "passage_scores.csv";
pub const SCORES_JSON: &str = "passage_scores.json";
pub const SUMMARY_JSON: &str = "summary.json";

/// 生成的报告文件路径
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub dir: PathBuf,
    pub scores_csv: PathBuf,
    pub scores_json: PathBuf,
    pub summary_json: PathBuf,
}

/// 单篇文章的报告行
#[derive(Debug, Clone, Serialize)]
pub struct PassageReport {
    pub id: String,
    /// 指标名 -> 数值 / 标签 / null
    pub metrics: BTreeMap<&'static str, JsonValue>,
    /// 指标名 -> 失败原因
    pub failures: BTreeMap<&'static str, String>,
    pub overall_difficulty: Option<f64>,
    pub difficulty_band: Option<DifficultyBand>,
    pub metrics_in_composite: usize,
}

/// 单个指标的汇总
#[derive(Debug, Clone, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub group: MetricGroup,
    pub succeeded: usize,
    pub failed: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<BTreeMap<String, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 整体汇总
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub generated_at: String,
    pub source: String,
    pub passage_count: usize,
    pub total_failures: usize,
    pub metrics: Vec<MetricSummary>,
    pub overall_difficulty_mean: Option<f64>,
    pub band_counts: BTreeMap<DifficultyBand, usize>,
}

/// 报告生成器
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 按原始顺序构建每篇文章的报告行
    pub fn build_passage_reports(
        &self,
        store: &PassageStore,
        results: &MetricResults,
    ) -> Vec<PassageReport> {
        let metrics = results.recorded_metrics();
        store
            .passages()
            .iter()
            .map(|passage| {
                let empty = BTreeMap::new();
                let values = results.passage_metrics(&passage.id).unwrap_or(&empty);

                let mut row_metrics = BTreeMap::new();
                let mut failures = BTreeMap::new();
                for metric in &metrics {
                    let json = match values.get(metric) {
                        Some(MetricValue::Score { value }) => JsonValue::from(*value),
                        Some(MetricValue::Category { label }) => JsonValue::from(label.as_str()),
                        Some(MetricValue::Failed { reason }) => {
                            failures.insert(metric.name(), reason.clone());
                            JsonValue::Null
                        }
                        None => JsonValue::Null,
                    };
                    row_metrics.insert(metric.name(), json);
                }

                let difficulty: Option<Difficulty> = overall_difficulty(values);
                PassageReport {
                    id: passage.id.clone(),
                    metrics: row_metrics,
                    failures,
                    overall_difficulty: difficulty.as_ref().map(|d| d.score),
                    difficulty_band: difficulty.as_ref().map(|d| d.band),
                    metrics_in_composite: difficulty.map(|d| d.metrics_used).unwrap_or(0),
                }
            })
            .collect()
    }

    /// 构建汇总
    pub fn build_summary(
        &self,
        store: &PassageStore,
        results: &MetricResults,
        passages: &[PassageReport],
    ) -> SummaryReport {
        let metrics = results
            .runs()
            .iter()
            .map(|run| summarize_metric(run, results))
            .collect();

        let scores: Vec<f64> = passages
            .iter()
            .filter_map(|p| p.overall_difficulty)
            .collect();
        let mut band_counts = BTreeMap::new();
        for band in passages.iter().filter_map(|p| p.difficulty_band) {
            *band_counts.entry(band).or_insert(0) += 1;
        }

        SummaryReport {
            generated_at: chrono::Local::now().to_rfc3339(),
            source: store.source().to_string(),
            passage_count: store.len(),
            total_failures: results.total_failures(),
            metrics,
            overall_difficulty_mean: mean(&scores),
            band_counts,
        }
    }

    /// 写出全部报告文件
    pub fn write(
        &self,
        store: &PassageStore,
        results: &MetricResults,
    ) -> Result<ReportPaths, WriteError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| WriteError::CreateDirFailed {
            path: self.output_dir.display().to_string(),
            source,
        })?;

        let paths = ReportPaths {
            dir: self.output_dir.clone(),
            scores_csv: self.output_dir.join(SCORES_CSV),
            scores_json: self.output_dir.join(SCORES_JSON),
            summary_json: self.output_dir.join(SUMMARY_JSON),
        };

        let passages = self.build_passage_reports(store, results);
        let summary = self.build_summary(store, results, &passages);

        write_csv(&paths.scores_csv, &results.recorded_metrics(), &passages)?;
        write_json(&paths.scores_json, &passages)?;
        write_json(&paths.summary_json, &summary)?;

        info!("📝 报告已写入: {}", paths.dir.display());
        Ok(paths)
    }
}

fn summarize_metric(run: &MetricRun, results: &MetricResults) -> MetricSummary {
    let values: Vec<&MetricValue> = results.metric_values(run.metric).collect();
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_score()).collect();

    let mut distribution = BTreeMap::new();
    for label in values.iter().filter_map(|v| v.as_category()) {
        *distribution.entry(label.to_string()).or_insert(0) += 1;
    }

    MetricSummary {
        metric: run.metric,
        group: run.metric.group(),
        succeeded: run.succeeded,
        failed: run.failed,
        mean: mean(&numbers),
        min: numbers.iter().copied().reduce(f64::min),
        max: numbers.iter().copied().reduce(f64::max),
        distribution: (!distribution.is_empty()).then_some(distribution),
        error: run.error.clone(),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn write_csv(
    path: &Path,
    metrics: &[Metric],
    passages: &[PassageReport],
) -> Result<(), WriteError> {
    let path_str = path.display().to_string();
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| WriteError::write_failed(&path_str, e))?;

    let mut header = vec!["passage_id".to_string()];
    header.extend(metrics.iter().map(|m| m.name().to_string()));
    header.push("overall_difficulty".to_string());
    header.push("difficulty_band".to_string());
    writer
        .write_record(&header)
        .map_err(|e| WriteError::write_failed(&path_str, e))?;

    for passage in passages {
        let mut row = vec![passage.id.clone()];
        for metric in metrics {
            let cell = match passage.metrics.get(metric.name()) {
                Some(JsonValue::Number(n)) => n
                    .as_f64()
                    .map(|v| MetricValue::score(v).cell())
                    .unwrap_or_default(),
                Some(JsonValue::String(s)) => s.clone(),
                _ => String::new(),
            };
            row.push(cell);
        }
        row.push(
            passage
                .overall_difficulty
                .map(|s| format!("{:.1}", s))
                .unwrap_or_default(),
        );
        row.push(
            passage
                .difficulty_band
                .map(|b| b.to_string())
                .unwrap_or_default(),
        );
        writer
            .write_record(&row)
            .map_err(|e| WriteError::write_failed(&path_str, e))?;
    }

    writer
        .flush()
        .map_err(|e| WriteError::write_failed(&path_str, e))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), WriteError> {
    let path_str = path.display().to_string();
    let file = File::create(path).map_err(|e| WriteError::write_failed(&path_str, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|e| WriteError::write_failed(&path_str, e))
}
