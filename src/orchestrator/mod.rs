//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! app::App (加载 → 逐个指标 → 报告)
//!     ↓
//! services::MetricEngine (单个指标，所有文章)
//!     ↓
//! infrastructure::Dispatcher (有界并发扇出 + 重试)
//!     ↓
//! clients::TextModel (单次模型调用)
//! ```

pub mod app;

pub use app::{App, RunSummary};
