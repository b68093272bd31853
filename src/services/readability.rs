//! 本地公式指标
//!
//! 不调用外部服务，结果完全确定。

use crate::error::MetricError;
use crate::models::Metric;
use crate::services::text_stats::TextStats;
use crate::services::vocabulary::is_academic_word;

fn checked(stats: &TextStats) -> Result<(f64, f64), MetricError> {
    if stats.word_count() == 0 {
        return Err(MetricError::NoWords);
    }
    if stats.sentence_count == 0 {
        return Err(MetricError::NoSentences);
    }
    Ok((stats.word_count() as f64, stats.sentence_count as f64))
}

/// Flesch–Kincaid 年级水平
///
/// `0.39 × (词数/句数) + 11.8 × (音节数/词数) − 15.59`
pub fn flesch_kincaid_grade(text: &str) -> Result<f64, MetricError> {
    let stats = TextStats::analyze(text);
    let (words, sentences) = checked(&stats)?;
    let syllables = stats.syllable_count as f64;
    Ok(0.39 * (words / sentences) + 11.8 * (syllables / words) - 15.59)
}

/// 平均句长（词/句）
pub fn avg_sentence_length(text: &str) -> Result<f64, MetricError> {
    let stats = TextStats::analyze(text);
    let (words, sentences) = checked(&stats)?;
    Ok(words / sentences)
}

/// 难词比例：三个及以上音节的单词占比
pub fn vocabulary_difficulty_ratio(text: &str) -> Result<f64, MetricError> {
    let stats = TextStats::analyze(text);
    let (words, _) = checked(&stats)?;
    Ok(stats.complex_word_count as f64 / words)
}

/// 学术词占比
pub fn academic_word_usage(text: &str) -> Result<f64, MetricError> {
    let stats = TextStats::analyze(text);
    let (words, _) = checked(&stats)?;
    let academic = stats.words.iter().filter(|w| is_academic_word(w)).count();
    Ok(academic as f64 / words)
}

/// 计算一个本地指标
pub fn local_score(metric: Metric, text: &str) -> Result<f64, MetricError> {
    match metric {
        Metric::FleschKincaid => flesch_kincaid_grade(text),
        Metric::AvgSentenceLength => avg_sentence_length(text),
        Metric::VocabularyDifficulty => vocabulary_difficulty_ratio(text),
        Metric::AcademicWordUsage => academic_word_usage(text),
        other => Err(MetricError::WrongBacking {
            metric: other,
            expected: "本地公式",
        }),
    }
}
