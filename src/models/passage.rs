use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 一篇待评分的文章
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub text: String,
}

impl Passage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// 文章集合
///
/// 启动时加载一次，之后只读。保留原始顺序，报告按此顺序输出。
#[derive(Debug, Clone)]
pub struct PassageStore {
    passages: Vec<Passage>,
    source: String,
}

impl PassageStore {
    /// 从已解析的文章列表构建，校验非空、字段非空与 ID 唯一
    pub fn from_passages(
        passages: Vec<Passage>,
        source: impl Into<String>,
    ) -> Result<Self, LoadError> {
        let source = source.into();
        if passages.is_empty() {
            return Err(LoadError::Empty { path: source });
        }

        let mut seen = HashSet::with_capacity(passages.len());
        for (index, passage) in passages.iter().enumerate() {
            if passage.id.trim().is_empty() {
                return Err(LoadError::BlankField {
                    index: index + 1,
                    field: "id",
                });
            }
            if passage.text.trim().is_empty() {
                return Err(LoadError::BlankField {
                    index: index + 1,
                    field: "text",
                });
            }
            if !seen.insert(passage.id.as_str()) {
                return Err(LoadError::DuplicateId {
                    id: passage.id.clone(),
                });
            }
        }

        Ok(Self { passages, source })
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Passage> {
        self.passages.iter().find(|p| p.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.passages.iter().map(|p| p.id.as_str())
    }

    /// 数据来源（文件路径）
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_rejected() {
        let err = PassageStore::from_passages(Vec::new(), "empty.json").unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = PassageStore::from_passages(
            vec![Passage::new("p1", "One."), Passage::new("p1", "Two.")],
            "dup.json",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { id } if id == "p1"));
    }

    #[test]
    fn test_blank_text_rejected() {
        let err = PassageStore::from_passages(vec![Passage::new("p1", "   ")], "blank.json")
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::BlankField {
                index: 1,
                field: "text"
            }
        ));
    }

    #[test]
    fn test_order_preserved() {
        let store = PassageStore::from_passages(
            vec![
                Passage::new("b", "Second letter."),
                Passage::new("a", "First letter."),
            ],
            "order.json",
        )
        .unwrap();
        assert_eq!(store.ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(store.get("a").is_some());
        assert!(store.get("c").is_none());
    }
}
