//! 综合难度
//!
//! 把每个数值指标按固定范围归一化到 [0, 1]（方向统一为"越大越难"），
//! 再按权重取平均并放大到 0–100。失败或缺失的指标不参与计算，权重按可用指标重新归一。

use crate::models::{Metric, MetricValue, ScoreKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// 难度分档
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyBand {
    Easier,
    Moderate,
    Harder,
}

impl DifficultyBand {
    pub fn from_score(score: f64) -> Self {
        if score < 35.0 {
            DifficultyBand::Easier
        } else if score < 65.0 {
            DifficultyBand::Moderate
        } else {
            DifficultyBand::Harder
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyBand::Easier => "easier",
            DifficultyBand::Moderate => "moderate",
            DifficultyBand::Harder => "harder",
        }
    }
}

impl fmt::Display for DifficultyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单篇文章的综合难度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difficulty {
    /// 0–100
    pub score: f64,
    pub band: DifficultyBand,
    /// 参与计算的指标数
    pub metrics_used: usize,
}

/// 归一化单个数值指标；分类指标返回 None
pub fn normalize(metric: Metric, value: f64) -> Option<f64> {
    match metric.kind() {
        ScoreKind::Numeric {
            min,
            max,
            harder_when_higher,
        } => {
            let unit = ((value - min) / (max - min)).clamp(0.0, 1.0);
            Some(if harder_when_higher { unit } else { 1.0 - unit })
        }
        ScoreKind::Category { .. } => None,
    }
}

/// 计算综合难度；没有任何可用数值指标时返回 None
pub fn overall_difficulty(values: &BTreeMap<Metric, MetricValue>) -> Option<Difficulty> {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    let mut metrics_used = 0;

    for (metric, value) in values {
        let weight = metric.composite_weight();
        if weight <= 0.0 {
            continue;
        }
        let Some(unit) = value.as_score().and_then(|v| normalize(*metric, v)) else {
            continue;
        };
        weighted_sum += unit * weight;
        weight_total += weight;
        metrics_used += 1;
    }

    if metrics_used == 0 {
        return None;
    }

    let score = weighted_sum / weight_total * 100.0;
    Some(Difficulty {
        score,
        band: DifficultyBand::from_score(score),
        metrics_used,
    })
}
