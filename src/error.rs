use std::time::Duration;
use thiserror::Error;

use crate::models::Metric;

/// 运行期致命错误（加载 / 写入）
///
/// 单个指标的失败由驱动就地转成占位值，不会出现在这里。
#[derive(Debug, Error)]
pub enum AppError {
    /// 文章加载错误（致命）
    #[error("加载错误: {0}")]
    Load(#[from] LoadError),
    /// 报告写入错误（致命）
    #[error("写入错误: {0}")]
    Write(#[from] WriteError),
}

/// 文章加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 内容格式错误
    #[error("解析文件失败 ({path}): {message}")]
    ParseFailed { path: String, message: String },
    /// 不支持的扩展名
    #[error("不支持的文件格式 (仅支持 .json / .toml): {path}")]
    UnsupportedFormat { path: String },
    /// 文章集合为空
    #[error("文章集合为空: {path}")]
    Empty { path: String },
    /// 字段为空
    #[error("第 {index} 篇文章的 {field} 为空")]
    BlankField { index: usize, field: &'static str },
    /// ID 重复
    #[error("文章 ID 重复: {id}")]
    DuplicateId { id: String },
}

/// 外部模型调用错误
///
/// `is_transient()` 为真的错误会在调度器内按退避策略重试
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallError {
    /// 调用超时
    #[error("调用超时 ({after:?})")]
    Timeout { after: Duration },
    /// 请求频率限制
    #[error("请求频率限制, 建议等待: {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },
    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),
    /// API 返回错误
    #[error("API 返回错误: {0}")]
    Api(String),
    /// 返回内容为空
    #[error("模型返回内容为空")]
    EmptyResponse,
    /// 返回内容无法解析
    #[error("无法解析模型返回: {response}")]
    Unparseable { response: String },
}

impl CallError {
    /// 是否为可重试的临时错误
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CallError::Timeout { .. } | CallError::RateLimited { .. } | CallError::Network(_)
        )
    }

    /// 服务端建议的等待时间
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CallError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// 指标计算错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MetricError {
    /// 文本中没有可识别的单词
    #[error("文本中没有可识别的单词")]
    NoWords,
    /// 文本中没有可识别的句子
    #[error("文本中没有可识别的句子")]
    NoSentences,
    /// 指标不支持该计算路径
    #[error("指标 {metric} 不是{expected}指标")]
    WrongBacking {
        metric: Metric,
        expected: &'static str,
    },
    /// 结果数量与文章数量不一致
    #[error("指标 {metric} 返回 {got} 条结果, 期望 {expected} 条")]
    ResultCountMismatch {
        metric: Metric,
        expected: usize,
        got: usize,
    },
    /// 结果引用了不存在的文章
    #[error("指标 {metric} 的结果引用了未知文章: {passage_id}")]
    UnknownPassage { metric: Metric, passage_id: String },
    /// 同一 (文章, 指标) 重复记录
    #[error("重复记录: 文章 {passage_id} / 指标 {metric}")]
    DuplicateResult { metric: Metric, passage_id: String },
}

/// 报告写入错误
#[derive(Debug, Error)]
pub enum WriteError {
    /// 创建目录失败
    #[error("创建目录失败 ({path}): {source}")]
    CreateDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl WriteError {
    pub fn write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        WriteError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 取值不合法
    #[error("环境变量 {var_name} 取值不合法: {reason}")]
    InvalidValue { var_name: String, reason: String },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
