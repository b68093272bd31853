//! 解析模型回复
//!
//! 回复无法解析或超出范围时返回 `CallError::Unparseable`（不重试）。

use crate::error::CallError;
use crate::models::{Metric, MetricValue, ScoreKind};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// 按指标类型解析回复
pub fn parse_response(metric: Metric, response: &str) -> Result<MetricValue, CallError> {
    let unparseable = || CallError::Unparseable {
        response: crate::utils::logging::truncate_text(response, 80),
    };

    match metric.kind() {
        ScoreKind::Numeric { min, max, .. } => parse_number(response, min, max)
            .map(MetricValue::score)
            .ok_or_else(unparseable),
        ScoreKind::Category { labels } => parse_label(response, labels)
            .map(MetricValue::category)
            .ok_or_else(unparseable),
    }
}

fn number_regex() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"-?\d+(?:[.,]\d+)*").expect("合法的正则"))
}

/// 提取范围内的数字
///
/// 先尝试整体解析，再从文本中取带符号的数字（如 "Rating: 7/10"）。
/// 出现多个不同的范围内数字时忽略与量表端点相同的值（"on a scale of 1 to 10"）；
/// 仍不唯一则视为无法解析。
pub fn parse_number(response: &str, min: f64, max: f64) -> Option<f64> {
    let in_range = |v: f64| v.is_finite() && v >= min && v <= max;
    let response = response.trim();

    if let Ok(value) = response.parse::<f64>() {
        return in_range(value).then_some(value);
    }

    let mut candidates: Vec<f64> = Vec::new();
    for token in number_regex().find_iter(response) {
        let Ok(value) = token.as_str().replace(',', "").parse::<f64>() else {
            continue;
        };
        if in_range(value) && !candidates.contains(&value) {
            candidates.push(value);
        }
    }

    if candidates.len() > 1 {
        candidates.retain(|v| *v != min && *v != max);
    }

    match candidates.as_slice() {
        [value] => {
            debug!("从响应 '{}' 中提取到数值: {}", response, value);
            Some(*value)
        }
        _ => None,
    }
}

fn normalize(text: &str) -> String {
    text.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// 匹配分类标签：完全相同优先，其次为包含关系
pub fn parse_label(response: &str, labels: &[&'static str]) -> Option<&'static str> {
    let normalized = normalize(response);
    if normalized.is_empty() {
        return None;
    }

    if let Some(label) = labels.iter().copied().find(|l| *l == normalized) {
        return Some(label);
    }

    labels
        .iter()
        .filter_map(|label| normalized.find(label).map(|pos| (pos, *label)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, label)| label)
}
