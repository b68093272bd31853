use crate::error::LoadError;
use crate::models::passage::{Passage, PassageStore};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 文件中的一条文章记录，兼容 `passage_id` / `passage` 字段名
#[derive(Debug, Deserialize)]
struct RawPassage {
    #[serde(alias = "passage_id")]
    id: RawId,
    #[serde(alias = "passage")]
    text: String,
}

/// ID 可以是字符串或整数
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawPassage> for Passage {
    fn from(raw: RawPassage) -> Self {
        let id = match raw.id {
            RawId::Text(id) => id.trim().to_string(),
            RawId::Number(n) => n.to_string(),
        };
        Passage::new(id, raw.text)
    }
}

/// JSON：顶层数组，或 `{"passages": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    List(Vec<RawPassage>),
    Wrapped { passages: Vec<RawPassage> },
}

/// TOML：`[[passages]]` 表数组
#[derive(Debug, Deserialize)]
struct TomlDocument {
    #[serde(default)]
    passages: Vec<RawPassage>,
}

/// 支持的文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassageFormat {
    Json,
    Toml,
}

impl PassageFormat {
    /// 根据扩展名判断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Some(PassageFormat::Json),
            Some("toml") => Some(PassageFormat::Toml),
            _ => None,
        }
    }
}

/// 从文件加载文章集合
///
/// 任何读取、解析或校验失败都返回 `LoadError`，调用方应在计算任何指标之前终止。
pub async fn load_passages(path: &Path) -> Result<PassageStore, LoadError> {
    let path_str = path.display().to_string();

    let format = PassageFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path_str.clone(),
    })?;

    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(LoadError::NotFound { path: path_str });
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::ReadFailed {
            path: path_str.clone(),
            source,
        })?;

    tracing::info!("正在加载: {}", path_str);
    parse_passages(&content, format, &path_str)
}
