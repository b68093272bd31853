use crate::error::ConfigError;
use crate::infrastructure::RetryPolicy;
use crate::models::Metric;
use std::str::FromStr;
use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 文章文件路径（.json / .toml）
    pub passages_file: String,
    /// 报告输出目录
    pub output_dir: String,
    /// 每个模型指标的并发 worker 数量
    pub max_workers: usize,
    /// 单篇文章的最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 退避基础等待时间（毫秒）
    pub retry_base_delay_ms: u64,
    /// 退避最大等待时间（毫秒）
    pub retry_max_delay_ms: u64,
    /// 单次外部调用超时（秒）
    pub call_timeout_secs: u64,
    /// 要计算的指标，空表示全部
    pub metrics: Vec<Metric>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            passages_file: "fixed-passages-analyze.json".to_string(),
            output_dir: "results".to_string(),
            max_workers: 5,
            max_attempts: 4,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 8_000,
            call_timeout_secs: 60,
            metrics: Vec::new(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        let config = Self {
            passages_file: env_string("PASSAGES_FILE").unwrap_or(default.passages_file),
            output_dir: env_string("OUTPUT_DIR").unwrap_or(default.output_dir),
            max_workers: env_parse("MAX_WORKERS", "usize")?.unwrap_or(default.max_workers),
            max_attempts: env_parse("MAX_ATTEMPTS", "u32")?.unwrap_or(default.max_attempts),
            retry_base_delay_ms: env_parse("RETRY_BASE_DELAY_MS", "u64")?
                .unwrap_or(default.retry_base_delay_ms),
            retry_max_delay_ms: env_parse("RETRY_MAX_DELAY_MS", "u64")?
                .unwrap_or(default.retry_max_delay_ms),
            call_timeout_secs: env_parse("CALL_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.call_timeout_secs),
            metrics: match env_string("METRICS") {
                Some(raw) => parse_metric_list(&raw)?,
                None => default.metrics,
            },
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
            llm_api_key: env_string("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "MAX_WORKERS".to_string(),
                reason: "至少需要 1 个 worker".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                var_name: "MAX_ATTEMPTS".to_string(),
                reason: "至少需要尝试 1 次".to_string(),
            });
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(ConfigError::InvalidValue {
                var_name: "RETRY_BASE_DELAY_MS".to_string(),
                reason: format!("不能大于 RETRY_MAX_DELAY_MS ({})", self.retry_max_delay_ms),
            });
        }
        Ok(())
    }

    /// 由配置构建重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            call_timeout: Duration::from_secs(self.call_timeout_secs),
        }
    }

    /// 实际要计算的指标（按原始驱动顺序）
    pub fn selected_metrics(&self) -> Vec<Metric> {
        if self.metrics.is_empty() {
            Metric::ALL.to_vec()
        } else {
            Metric::ALL
                .iter()
                .copied()
                .filter(|m| self.metrics.contains(m))
                .collect()
        }
    }

    pub fn has_llm_credentials(&self) -> bool {
        !self.llm_api_key.trim().is_empty()
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

/// 解析逗号分隔的指标列表，如 `flesch_kincaid,lexile`
pub fn parse_metric_list(raw: &str) -> Result<Vec<Metric>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            name.parse::<Metric>()
                .map_err(|_| ConfigError::EnvVarParseFailed {
                    var_name: "METRICS".to_string(),
                    value: name.to_string(),
                    expected_type: "metric name".to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = Config {
            max_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_metric_list() {
        let metrics = parse_metric_list("lexile, flesch_kincaid,,").unwrap();
        assert_eq!(metrics, vec![Metric::Lexile, Metric::FleschKincaid]);
        assert!(parse_metric_list("lexile,not_a_metric").is_err());
    }

    #[test]
    fn test_selected_metrics_keeps_driver_order() {
        let config = Config {
            metrics: vec![Metric::AuthorsPurpose, Metric::FleschKincaid],
            ..Default::default()
        };
        assert_eq!(
            config.selected_metrics(),
            vec![Metric::FleschKincaid, Metric::AuthorsPurpose]
        );
        assert_eq!(Config::default().selected_metrics().len(), Metric::ALL.len());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.call_timeout, Duration::from_secs(60));
    }
}
