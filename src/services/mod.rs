pub mod difficulty;
pub mod metric_engine;
pub mod prompts;
pub mod readability;
pub mod report_writer;
pub mod response_parser;
pub mod text_stats;
pub mod vocabulary;

pub use difficulty::{overall_difficulty, Difficulty, DifficultyBand};
pub use metric_engine::MetricEngine;
pub use report_writer::{ReportGenerator, ReportPaths};
pub use text_stats::TextStats;
