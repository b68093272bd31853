//! 指标结果累积表
//!
//! 以 (passage_id, metric) 为键，每个指标调用必须为每篇文章恰好提供一个值
//! （成功值或失败占位值）。

use crate::error::MetricError;
use crate::models::metric::{Metric, MetricResult, MetricValue};
use crate::models::passage::PassageStore;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// 单个指标的执行概况
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRun {
    pub metric: Metric,
    pub succeeded: usize,
    pub failed: usize,
    /// 整个指标失败时的原因
    pub error: Option<String>,
}

/// 显式的结果表，由驱动在每次指标调用后写入
#[derive(Debug, Clone)]
pub struct MetricResults {
    order: Vec<String>,
    values: HashMap<String, BTreeMap<Metric, MetricValue>>,
    runs: Vec<MetricRun>,
}

impl MetricResults {
    pub fn new(store: &PassageStore) -> Self {
        let order: Vec<String> = store.ids().map(str::to_string).collect();
        let values = order
            .iter()
            .map(|id| (id.clone(), BTreeMap::new()))
            .collect();
        Self {
            order,
            values,
            runs: Vec::new(),
        }
    }

    /// 记录一个指标的全部结果
    ///
    /// 先整体校验再写入：数量必须等于文章数，ID 必须存在且不重复。
    pub fn record(
        &mut self,
        metric: Metric,
        results: Vec<MetricResult>,
    ) -> Result<MetricRun, MetricError> {
        if results.len() != self.order.len() {
            return Err(MetricError::ResultCountMismatch {
                metric,
                expected: self.order.len(),
                got: results.len(),
            });
        }

        let mut seen = HashSet::with_capacity(results.len());
        for result in &results {
            let passage_id = result.passage_id.as_str();
            let existing = self
                .values
                .get(passage_id)
                .ok_or_else(|| MetricError::UnknownPassage {
                    metric,
                    passage_id: passage_id.to_string(),
                })?;
            if result.metric != metric
                || existing.contains_key(&metric)
                || !seen.insert(passage_id)
            {
                return Err(MetricError::DuplicateResult {
                    metric,
                    passage_id: passage_id.to_string(),
                });
            }
        }

        let failed = results.iter().filter(|r| r.value.is_failed()).count();
        for result in results {
            if let Some(slot) = self.values.get_mut(&result.passage_id) {
                slot.insert(metric, result.value);
            }
        }

        let run = MetricRun {
            metric,
            succeeded: self.order.len() - failed,
            failed,
            error: None,
        };
        self.runs.push(run.clone());
        Ok(run)
    }

    /// 整个指标失败：为所有尚无该指标值的文章写入失败占位值
    pub fn record_failure(&mut self, metric: Metric, error: &MetricError) -> MetricRun {
        let reason = error.to_string();
        for slot in self.values.values_mut() {
            slot.entry(metric)
                .or_insert_with(|| MetricValue::failed(reason.clone()));
        }
        let run = MetricRun {
            metric,
            succeeded: 0,
            failed: self.order.len(),
            error: Some(reason),
        };
        self.runs.push(run.clone());
        run
    }

    pub fn get(&self, passage_id: &str, metric: Metric) -> Option<&MetricValue> {
        self.values.get(passage_id)?.get(&metric)
    }

    /// 某篇文章的所有指标值
    pub fn passage_metrics(&self, passage_id: &str) -> Option<&BTreeMap<Metric, MetricValue>> {
        self.values.get(passage_id)
    }

    /// 已执行过的指标（按执行顺序）
    pub fn recorded_metrics(&self) -> Vec<Metric> {
        self.runs.iter().map(|r| r.metric).collect()
    }

    pub fn runs(&self) -> &[MetricRun] {
        &self.runs
    }

    /// 某指标的全部值（按文章顺序）
    pub fn metric_values(&self, metric: Metric) -> impl Iterator<Item = &MetricValue> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.values.get(id).and_then(|m| m.get(&metric)))
    }

    pub fn total_failures(&self) -> usize {
        self.runs.iter().map(|r| r.failed).sum()
    }
}
