//! 文本统计：分句、分词、音节计数
//!
//! 所有函数都是纯函数，不做任何 I/O。

use regex::Regex;
use std::sync::OnceLock;

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"[A-Za-z]+(?:['’][A-Za-z]+)*").expect("合法的正则"))
}

fn sentence_regex() -> &'static Regex {
    static SENTENCE: OnceLock<Regex> = OnceLock::new();
    SENTENCE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]*").expect("合法的正则"))
}

/// 一段文本的基础统计
#[derive(Debug, Clone, PartialEq)]
pub struct TextStats {
    /// 小写单词
    pub words: Vec<String>,
    pub sentence_count: usize,
    pub syllable_count: usize,
    /// 三个及以上音节的单词数
    pub complex_word_count: usize,
}

impl TextStats {
    pub fn analyze(text: &str) -> Self {
        let words: Vec<String> = tokenize_words(text)
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        let syllables: Vec<usize> = words.iter().map(|w| count_syllables(w)).collect();

        Self {
            sentence_count: count_sentences(text),
            syllable_count: syllables.iter().sum(),
            complex_word_count: syllables.iter().filter(|&&s| s >= 3).count(),
            words,
        }
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

/// 提取单词（保留撇号连接的缩写，如 don't）
pub fn tokenize_words(text: &str) -> Vec<&str> {
    word_regex().find_iter(text).map(|m| m.as_str()).collect()
}

/// 句子数：以 . ! ? 结尾（或文本结尾）且包含至少一个单词的片段
pub fn count_sentences(text: &str) -> usize {
    sentence_regex()
        .find_iter(text)
        .filter(|m| word_regex().is_match(m.as_str()))
        .count()
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// 基于元音组的英文音节估算
pub fn count_syllables(word: &str) -> usize {
    let w: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if w.is_empty() {
        return 0;
    }
    if w.len() <= 3 {
        return 1;
    }

    let mut count = 0;
    let mut prev_vowel = false;
    for &c in &w {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    let n = w.len();
    let before = |offset: usize| w[n - offset];
    if w[n - 1] == 'e' {
        // 词尾 -le 前为辅音时发音（simple, table）
        let sounded_le = before(2) == 'l' && !is_vowel(before(3));
        if !sounded_le {
            count -= 1;
        }
    } else if w[n - 1] == 'd' && before(2) == 'e' {
        if !matches!(before(3), 't' | 'd') {
            count -= 1;
        }
    } else if w[n - 1] == 's' && before(2) == 'e' {
        let sibilant = matches!(before(3), 's' | 'x' | 'z' | 'c' | 'g')
            || (before(3) == 'h' && matches!(before(4), 'c' | 's'));
        if !sibilant {
            count -= 1;
        }
    }

    count.max(1)
}
