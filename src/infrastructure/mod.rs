//! 基础设施层
//!
//! - `Dispatcher` - 有界并发扇出，负责重试、失败占位与取消
//! - `RetryPolicy` - 退避策略

pub mod dispatcher;
pub mod retry;

pub use dispatcher::{DispatchStats, Dispatcher, TaskOutcome};
pub use retry::RetryPolicy;
