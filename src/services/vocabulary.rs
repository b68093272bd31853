//! 学术词表（Academic Word List 高频词族词头）

use phf::{phf_set, Set};

/// AWL 子表 1–3 的词头
static ACADEMIC_WORDS: Set<&'static str> = phf_set! {
    "analyse", "analyze", "analysis", "approach", "area", "assess", "assume", "authority",
    "available", "benefit", "concept", "consist", "constitute", "context", "contract",
    "create", "data", "define", "derive", "distribute", "economy", "environment",
    "establish", "estimate", "evident", "evidence", "export", "factor", "finance", "formula",
    "function", "identify", "income", "indicate", "individual", "interpret", "involve",
    "issue", "labour", "labor", "legal", "legislate", "major", "method", "occur", "percent",
    "period", "policy", "principle", "proceed", "process", "require", "research", "respond",
    "role", "section", "sector", "significant", "similar", "source", "specific", "structure",
    "theory", "vary", "achieve", "acquire", "administrate", "affect", "appropriate", "aspect",
    "assist", "category", "chapter", "commission", "community", "complex", "compute",
    "conclude", "conduct", "consequent", "construct", "consume", "credit", "culture",
    "design", "distinct", "element", "equate", "evaluate", "feature", "final", "focus",
    "impact", "injure", "institute", "invest", "item", "journal", "maintain", "normal",
    "obtain", "participate", "perceive", "positive", "potential", "previous", "primary",
    "purchase", "range", "region", "regulate", "relevant", "reside", "resource", "restrict",
    "secure", "seek", "select", "site", "strategy", "survey", "text", "tradition", "transfer",
    "alternative", "circumstance", "comment", "compensate", "component", "consent",
    "considerable", "constant", "constrain", "contribute", "convene", "coordinate", "core",
    "corporate", "correspond", "criteria", "deduce", "demonstrate", "document", "dominate",
    "emphasis", "ensure", "exclude", "framework", "fund", "illustrate", "immigrate", "imply",
    "initial", "instance", "interact", "justify", "layer", "link", "locate", "maximise",
    "maximize", "minor", "negate", "outcome", "partner", "philosophy", "physical", "proportion",
    "publish", "react", "register", "rely", "remove", "scheme", "sequence", "sex", "shift",
    "specify", "sufficient", "task", "technical", "technique", "technology", "valid", "volume",
    "hypothesis", "phenomenon", "paradigm", "empirical", "abstract", "implicit", "explicit",
    "ideology", "inherent", "notion", "perspective", "subsequent", "thesis",
};

/// (后缀, 去掉后缀后可能补回的结尾)
const SUFFIXES: &[(&str, &[&str])] = &[
    ("ies", &["y"]),
    ("ing", &["", "e"]),
    ("ed", &["", "e"]),
    ("es", &["", "e"]),
    ("s", &[""]),
    ("ly", &[""]),
    ("ation", &["e", "", "ate"]),
    ("al", &["", "e"]),
    ("ity", &["", "e"]),
];

/// 候选词干：原词及常见屈折 / 派生后缀去除后的形式
fn candidate_stems(word: &str) -> Vec<String> {
    let mut stems = vec![word.to_string()];
    for &(suffix, replacements) in SUFFIXES {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.len() < 3 {
                continue;
            }
            for replacement in replacements {
                stems.push(format!("{}{}", base, replacement));
            }
        }
    }
    stems
}

/// 是否属于学术词表（大小写不敏感）
pub fn is_academic_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    candidate_stems(&lower)
        .iter()
        .any(|stem| ACADEMIC_WORDS.contains(stem.as_str()))
}
