//! LLM API 客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use crate::config::Config;
use crate::error::CallError;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 文本生成模型
///
/// 调度器和指标引擎只依赖这个 trait，测试中可以替换为假实现。
pub trait TextModel: Send + Sync + 'static {
    /// 发送一次对话请求，返回去掉首尾空白的回复文本
    fn complete(
        &self,
        system_message: &str,
        user_message: &str,
    ) -> impl Future<Output = Result<String, CallError>> + Send;

    /// 日志中显示的模型名
    fn model_name(&self) -> &str;
}

/// 基于 async-openai 的 LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    async fn send(&self, system_message: &str, user_message: &str) -> Result<String, CallError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(|e| CallError::Api(e.to_string()))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| CallError::Api(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.0)
            .max_tokens(32u32)
            .build()
            .map_err(|e| CallError::Api(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            let err = classify_api_error(&e.to_string());
            warn!("LLM API 调用失败: {}", err);
            err
        })?;

        debug!("LLM API 调用成功");

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CallError::EmptyResponse)
    }
}

impl TextModel for LlmClient {
    fn complete(
        &self,
        system_message: &str,
        user_message: &str,
    ) -> impl Future<Output = Result<String, CallError>> + Send {
        self.send(system_message, user_message)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// 将 API 错误文本归类为临时 / 永久错误
///
/// 限流、超时、连接类错误可重试；鉴权、参数等错误不可重试。
pub fn classify_api_error(message: &str) -> CallError {
    let lower = message.to_ascii_lowercase();

    if lower.contains("rate limit") || lower.contains("rate_limit") || lower.contains("429") {
        return CallError::RateLimited {
            retry_after: parse_retry_after(&lower),
        };
    }
    if lower.contains("timed out") || lower.contains("timeout") {
        return CallError::Timeout {
            after: Duration::ZERO,
        };
    }
    let transient_markers = [
        "error sending request",
        "connection",
        "connect",
        "502",
        "503",
        "504",
        "overloaded",
        "temporarily unavailable",
    ];
    if transient_markers.iter().any(|m| lower.contains(m)) {
        return CallError::Network(message.to_string());
    }

    CallError::Api(message.to_string())
}

/// 从 "try again in 1.5s" 一类提示中提取等待时间
fn parse_retry_after(lower: &str) -> Option<Duration> {
    let rest = lower.split("try again in").nth(1)?.trim_start();
    let number: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = number.parse().ok()?;
    let unit = rest[number.len()..].trim_start();
    if unit.starts_with("ms") {
        Some(Duration::from_secs_f64(value / 1000.0))
    } else {
        Some(Duration::from_secs_f64(value))
    }
}
