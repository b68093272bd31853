//! # Passage Analyzer
//!
//! 批量计算阅读文章的可读性与复杂度指标并生成报告
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 有界并发调度器 `Dispatcher`，负责重试、失败占位值和取消
//!
//! ### ② 外部客户端（Clients）
//! - `clients/` - `TextModel` trait 与基于 async-openai 的 `LlmClient`
//!
//! ### ③ 业务能力层（Services）
//! - `MetricEngine` - 单个指标的计算（本地公式 / 模型）
//! - `readability` / `text_stats` / `vocabulary` - 本地公式
//! - `prompts` / `response_parser` - 模型指标的提示词与回复解析
//! - `difficulty` / `report_writer` - 综合难度与报告输出
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator::App` - 加载 → 逐个指标 → 报告
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::{LlmClient, TextModel};
pub use config::Config;
pub use error::{AppError, AppResult, CallError, LoadError, MetricError, WriteError};
pub use infrastructure::{Dispatcher, RetryPolicy, TaskOutcome};
pub use models::{Metric, MetricResult, MetricResults, MetricValue, Passage, PassageStore};
pub use orchestrator::{App, RunSummary};
pub use services::{MetricEngine, ReportGenerator, ReportPaths};
