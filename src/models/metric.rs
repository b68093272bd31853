//! 指标定义与指标值

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 所有指标（顺序即驱动执行顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Lexile,
    FleschKincaid,
    AvgSentenceLength,
    VocabularyDifficulty,
    AcademicWordUsage,
    DomainSpecificTerminology,
    SubordinateClauses,
    SyntacticVariety,
    StructuralInversions,
    EmbeddedClauses,
    AbstractionLevel,
    ConceptFamiliarity,
    ImpliedInformation,
    ArgumentativeComplexity,
    OrganizationalClarity,
    TransitionalElements,
    PriorKnowledgeRequirements,
    DisciplinaryPerspective,
    LanguageModernity,
    InferenceRequirement,
    FigurativeLanguage,
    AuthorsPurpose,
}

/// 指标分组（报告中按组展示）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricGroup {
    Readability,
    Vocabulary,
    Syntax,
    ConceptualDensity,
    RhetoricalStructure,
    ContentAccessibility,
    CognitiveDemands,
}

/// 指标取值类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreKind {
    /// 数值，`[min, max]` 用于归一化；`harder_when_higher` 决定方向
    Numeric {
        min: f64,
        max: f64,
        harder_when_higher: bool,
    },
    /// 分类标签
    Category { labels: &'static [&'static str] },
}

const RATING: ScoreKind = ScoreKind::Numeric {
    min: 1.0,
    max: 10.0,
    harder_when_higher: true,
};

const RATING_INVERTED: ScoreKind = ScoreKind::Numeric {
    min: 1.0,
    max: 10.0,
    harder_when_higher: false,
};

pub const DISCIPLINES: &[&str] = &[
    "natural_science",
    "social_science",
    "history",
    "humanities",
    "literature",
];

pub const PURPOSES: &[&str] = &["inform", "argue", "narrate", "describe", "analyze", "reflect"];

impl Metric {
    pub const ALL: [Metric; 22] = [
        Metric::Lexile,
        Metric::FleschKincaid,
        Metric::AvgSentenceLength,
        Metric::VocabularyDifficulty,
        Metric::AcademicWordUsage,
        Metric::DomainSpecificTerminology,
        Metric::SubordinateClauses,
        Metric::SyntacticVariety,
        Metric::StructuralInversions,
        Metric::EmbeddedClauses,
        Metric::AbstractionLevel,
        Metric::ConceptFamiliarity,
        Metric::ImpliedInformation,
        Metric::ArgumentativeComplexity,
        Metric::OrganizationalClarity,
        Metric::TransitionalElements,
        Metric::PriorKnowledgeRequirements,
        Metric::DisciplinaryPerspective,
        Metric::LanguageModernity,
        Metric::InferenceRequirement,
        Metric::FigurativeLanguage,
        Metric::AuthorsPurpose,
    ];

    /// 报告中使用的列名
    pub fn name(self) -> &'static str {
        match self {
            Metric::Lexile => "lexile",
            Metric::FleschKincaid => "flesch_kincaid",
            Metric::AvgSentenceLength => "avg_sentence_length",
            Metric::VocabularyDifficulty => "vocabulary_difficulty",
            Metric::AcademicWordUsage => "academic_word_usage",
            Metric::DomainSpecificTerminology => "domain_specific_terminology",
            Metric::SubordinateClauses => "subordinate_clauses",
            Metric::SyntacticVariety => "syntactic_variety",
            Metric::StructuralInversions => "structural_inversions",
            Metric::EmbeddedClauses => "embedded_clauses",
            Metric::AbstractionLevel => "abstraction_level",
            Metric::ConceptFamiliarity => "concept_familiarity",
            Metric::ImpliedInformation => "implied_information",
            Metric::ArgumentativeComplexity => "argumentative_complexity",
            Metric::OrganizationalClarity => "organizational_clarity",
            Metric::TransitionalElements => "transitional_elements",
            Metric::PriorKnowledgeRequirements => "prior_knowledge_requirements",
            Metric::DisciplinaryPerspective => "disciplinary_perspective",
            Metric::LanguageModernity => "language_modernity",
            Metric::InferenceRequirement => "inference_requirement",
            Metric::FigurativeLanguage => "figurative_language",
            Metric::AuthorsPurpose => "authors_purpose",
        }
    }

    /// 是否需要调用外部模型
    pub fn is_model_backed(self) -> bool {
        !matches!(
            self,
            Metric::FleschKincaid
                | Metric::AvgSentenceLength
                | Metric::VocabularyDifficulty
                | Metric::AcademicWordUsage
        )
    }

    pub fn group(self) -> MetricGroup {
        match self {
            Metric::Lexile | Metric::FleschKincaid | Metric::AvgSentenceLength => {
                MetricGroup::Readability
            }
            Metric::VocabularyDifficulty
            | Metric::AcademicWordUsage
            | Metric::DomainSpecificTerminology => MetricGroup::Vocabulary,
            Metric::SubordinateClauses
            | Metric::SyntacticVariety
            | Metric::StructuralInversions
            | Metric::EmbeddedClauses => MetricGroup::Syntax,
            Metric::AbstractionLevel | Metric::ConceptFamiliarity | Metric::ImpliedInformation => {
                MetricGroup::ConceptualDensity
            }
            Metric::ArgumentativeComplexity
            | Metric::OrganizationalClarity
            | Metric::TransitionalElements => MetricGroup::RhetoricalStructure,
            Metric::PriorKnowledgeRequirements
            | Metric::DisciplinaryPerspective
            | Metric::LanguageModernity => MetricGroup::ContentAccessibility,
            Metric::InferenceRequirement | Metric::FigurativeLanguage | Metric::AuthorsPurpose => {
                MetricGroup::CognitiveDemands
            }
        }
    }

    pub fn kind(self) -> ScoreKind {
        match self {
            Metric::Lexile => ScoreKind::Numeric {
                min: 200.0,
                max: 1700.0,
                harder_when_higher: true,
            },
            Metric::FleschKincaid => ScoreKind::Numeric {
                min: 0.0,
                max: 16.0,
                harder_when_higher: true,
            },
            Metric::AvgSentenceLength => ScoreKind::Numeric {
                min: 5.0,
                max: 35.0,
                harder_when_higher: true,
            },
            Metric::VocabularyDifficulty => ScoreKind::Numeric {
                min: 0.0,
                max: 0.35,
                harder_when_higher: true,
            },
            Metric::AcademicWordUsage => ScoreKind::Numeric {
                min: 0.0,
                max: 0.15,
                harder_when_higher: true,
            },
            Metric::ConceptFamiliarity
            | Metric::OrganizationalClarity
            | Metric::TransitionalElements
            | Metric::LanguageModernity => RATING_INVERTED,
            Metric::DisciplinaryPerspective => ScoreKind::Category {
                labels: DISCIPLINES,
            },
            Metric::AuthorsPurpose => ScoreKind::Category { labels: PURPOSES },
            _ => RATING,
        }
    }

    /// 综合难度中的权重；分类指标为 0
    pub fn composite_weight(self) -> f64 {
        match self {
            Metric::Lexile | Metric::FleschKincaid => 2.0,
            Metric::VocabularyDifficulty
            | Metric::InferenceRequirement
            | Metric::PriorKnowledgeRequirements
            | Metric::AbstractionLevel => 1.5,
            Metric::DisciplinaryPerspective | Metric::AuthorsPurpose => 0.0,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| format!("未知指标: {}", s))
    }
}

/// 单篇文章的某个指标值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricValue {
    /// 数值结果
    Score { value: f64 },
    /// 分类结果
    Category { label: String },
    /// 失败占位值（重试耗尽 / 计算失败 / 被取消）
    Failed { reason: String },
}

impl MetricValue {
    pub fn score(value: f64) -> Self {
        MetricValue::Score { value }
    }

    pub fn category(label: impl Into<String>) -> Self {
        MetricValue::Category {
            label: label.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        MetricValue::Failed {
            reason: reason.into(),
        }
    }

    pub fn as_score(&self) -> Option<f64> {
        match self {
            MetricValue::Score { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            MetricValue::Category { label } => Some(label),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, MetricValue::Failed { .. })
    }

    /// CSV 单元格文本；失败值输出为空
    pub fn cell(&self) -> String {
        match self {
            MetricValue::Score { value } => format!("{:.3}", value),
            MetricValue::Category { label } => label.clone(),
            MetricValue::Failed { .. } => String::new(),
        }
    }
}

/// 一条指标结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub passage_id: String,
    pub metric: Metric,
    pub value: MetricValue,
}

impl MetricResult {
    pub fn new(passage_id: impl Into<String>, metric: Metric, value: MetricValue) -> Self {
        Self {
            passage_id: passage_id.into(),
            metric,
            value,
        }
    }
}
