//! 模型指标的提示词

use crate::models::{Metric, ScoreKind};

/// 所有模型指标共用的系统消息
pub const SYSTEM_MESSAGE: &str = "You are an expert in reading assessment who evaluates \
the difficulty of SAT reading passages. Follow the rating instructions exactly and reply \
with only the requested value, without any explanation.";

/// 每个模型指标的评分说明
fn instruction(metric: Metric) -> Option<&'static str> {
    let text = match metric {
        Metric::Lexile => {
            "Estimate the Lexile measure of the passage, i.e. the reading level at which a \
             reader would comprehend it with about 75% accuracy."
        }
        Metric::DomainSpecificTerminology => {
            "Rate how heavily the passage relies on domain-specific or technical terminology \
             that a general high-school reader would not know. 1 = none, 10 = pervasive \
             specialist vocabulary."
        }
        Metric::SubordinateClauses => {
            "Rate the density of subordinate (dependent) clauses in the passage's sentences. \
             1 = almost only simple sentences, 10 = most sentences contain several \
             subordinate clauses."
        }
        Metric::SyntacticVariety => {
            "Rate the variety of sentence structures in the passage. 1 = uniform, repetitive \
             structures, 10 = highly varied structures that demand flexible parsing."
        }
        Metric::StructuralInversions => {
            "Rate how often the passage uses structural inversions or non-canonical word \
             order (fronting, inverted subject-verb order, cleft constructions). 1 = never, \
             10 = very frequently."
        }
        Metric::EmbeddedClauses => {
            "Rate the depth and frequency of embedded clauses (clauses nested inside other \
             clauses, long interrupting phrases). 1 = none, 10 = deep, frequent nesting."
        }
        Metric::AbstractionLevel => {
            "Rate how abstract the ideas in the passage are. 1 = concrete, tangible events \
             and objects, 10 = highly abstract theoretical concepts."
        }
        Metric::ConceptFamiliarity => {
            "Rate how familiar the passage's concepts would be to a typical high-school \
             junior. 1 = very unfamiliar, 10 = very familiar everyday concepts."
        }
        Metric::ImpliedInformation => {
            "Rate how much essential information is implied rather than stated explicitly. \
             1 = everything is stated, 10 = the main points must be inferred."
        }
        Metric::ArgumentativeComplexity => {
            "Rate the complexity of the passage's argument (claims, counterclaims, \
             qualifications, layered evidence). 1 = no argument or a single plain claim, \
             10 = intricate multi-layered argumentation."
        }
        Metric::OrganizationalClarity => {
            "Rate how clearly the passage is organized and how easy its structure is to \
             follow. 1 = confusing organization, 10 = exceptionally clear organization."
        }
        Metric::TransitionalElements => {
            "Rate how well transitional words and phrases guide the reader between ideas. \
             1 = almost no helpful transitions, 10 = abundant, explicit transitions."
        }
        Metric::PriorKnowledgeRequirements => {
            "Rate how much background knowledge a reader needs to understand the passage. \
             1 = none beyond everyday experience, 10 = substantial specialized knowledge."
        }
        Metric::DisciplinaryPerspective => {
            "Classify the academic discipline whose perspective the passage primarily \
             reflects."
        }
        Metric::LanguageModernity => {
            "Rate how modern the passage's language is. 1 = archaic or 18th/19th-century \
             style, 10 = fully contemporary usage."
        }
        Metric::InferenceRequirement => {
            "Rate how much inferential reasoning is needed to understand the passage's \
             meaning and the author's intent. 1 = purely literal, 10 = heavy inference."
        }
        Metric::FigurativeLanguage => {
            "Rate the amount and difficulty of figurative language (metaphor, irony, \
             symbolism, idiom). 1 = none, 10 = dense and subtle figurative language."
        }
        Metric::AuthorsPurpose => "Classify the author's primary purpose in the passage.",
        Metric::FleschKincaid
        | Metric::AvgSentenceLength
        | Metric::VocabularyDifficulty
        | Metric::AcademicWordUsage => return None,
    };
    Some(text)
}

/// 回复格式要求
fn answer_format(kind: ScoreKind) -> String {
    match kind {
        ScoreKind::Numeric { min, max, .. } if max - min > 100.0 => format!(
            "Reply with a single integer between {} and {}.",
            min as i64, max as i64
        ),
        ScoreKind::Numeric { min, max, .. } => format!(
            "Reply with a single number from {} to {}.",
            min as i64, max as i64
        ),
        ScoreKind::Category { labels } => format!(
            "Reply with exactly one of these labels: {}.",
            labels.join(", ")
        ),
    }
}

/// 构建用户消息；本地指标返回 None
pub fn build_user_message(metric: Metric, passage_text: &str) -> Option<String> {
    let instruction = instruction(metric)?;
    Some(format!(
        "{}\n{}\n\nPassage:\n\"\"\"\n{}\n\"\"\"",
        instruction,
        answer_format(metric.kind()),
        passage_text.trim()
    ))
}
